//! Runtime-tunable capacities.
//!
//! The original engine bakes pool and buffer sizes in as compile-time
//! constants (`#define MAX_VERTEX_BUFFERS 4096`, `MAX_COMMAND_BUFFER_SIZE`,
//! ...). Per the re-architecture notes, this core turns all of them into
//! constructor parameters so the same types serve any finite capacity;
//! [`RendererConfig::default`] reproduces the original's orders of
//! magnitude, and [`RendererConfig::from_config`] layers overrides from a
//! `config::Config` source the way the rest of this lineage's binaries do.

/// Capacities for every handle class and fixed-size buffer the core owns.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub max_vertex_buffers: usize,
    pub max_index_buffers: usize,
    pub max_textures: usize,
    pub max_shaders: usize,
    pub max_programs: usize,
    pub max_uniforms: usize,
    pub max_render_targets: usize,

    /// Command buffer capacity in bytes, per context.
    pub command_buffer_size: usize,
    /// Constant buffer capacity in bytes, per context.
    pub constant_buffer_size: usize,
    /// Max number of committed draws per context per frame.
    pub max_draws_per_frame: usize,

    /// Size in bytes of the shared transient vertex ring.
    pub transient_vertex_buffer_size: usize,
    /// Size in bytes of the shared transient index ring.
    pub transient_index_buffer_size: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            max_vertex_buffers: 4096,
            max_index_buffers: 4096,
            max_textures: 4096,
            max_shaders: 512,
            max_programs: 512,
            max_uniforms: 512,
            max_render_targets: 512,

            command_buffer_size: 1024 * 1024,
            constant_buffer_size: 256 * 1024,
            max_draws_per_frame: 8192,

            transient_vertex_buffer_size: 4 * 1024 * 1024,
            transient_index_buffer_size: 2 * 1024 * 1024,
        }
    }
}

impl RendererConfig {
    /// Builds a config by layering values out of a `config::Config`
    /// source over the defaults above. Missing keys fall back silently,
    /// matching the layered-override convention the rest of this
    /// lineage's boilerplate binaries use for engine settings.
    pub fn from_config(source: &config::Config) -> Self {
        let defaults = RendererConfig::default();
        RendererConfig {
            max_vertex_buffers: source
                .get_int("renderer.max_vertex_buffers")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_vertex_buffers),
            max_index_buffers: source
                .get_int("renderer.max_index_buffers")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_index_buffers),
            max_textures: source
                .get_int("renderer.max_textures")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_textures),
            max_shaders: source
                .get_int("renderer.max_shaders")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_shaders),
            max_programs: source
                .get_int("renderer.max_programs")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_programs),
            max_uniforms: source
                .get_int("renderer.max_uniforms")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_uniforms),
            max_render_targets: source
                .get_int("renderer.max_render_targets")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_render_targets),
            command_buffer_size: source
                .get_int("renderer.command_buffer_size")
                .map(|v| v as usize)
                .unwrap_or(defaults.command_buffer_size),
            constant_buffer_size: source
                .get_int("renderer.constant_buffer_size")
                .map(|v| v as usize)
                .unwrap_or(defaults.constant_buffer_size),
            max_draws_per_frame: source
                .get_int("renderer.max_draws_per_frame")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_draws_per_frame),
            transient_vertex_buffer_size: source
                .get_int("renderer.transient_vertex_buffer_size")
                .map(|v| v as usize)
                .unwrap_or(defaults.transient_vertex_buffer_size),
            transient_index_buffer_size: source
                .get_int("renderer.transient_index_buffer_size")
                .map(|v| v as usize)
                .unwrap_or(defaults.transient_index_buffer_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_positive() {
        let cfg = RendererConfig::default();
        assert!(cfg.max_vertex_buffers > 0);
        assert!(cfg.command_buffer_size > 0);
        assert!(cfg.transient_vertex_buffer_size > 0);
    }
}
