//! The build pipeline shared by the HTTP handlers and the CLI:
//! adapters, then cache lookup, then the builder.

use std::sync::Arc;

use crate::adapters::AdapterRegistry;
use crate::builders::BuilderRegistry;
use crate::cache::RenderCache;
use crate::error::BuildError;
use crate::widget::{BuildOutput, BuildRequest};

/// How much of the pipeline a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Payload goes to the builder as-is; nothing is cached.
    Direct,
    /// Payload is normalized by the adapters and results are cached.
    Adapted,
}

#[derive(Debug, Clone)]
pub struct Rendered {
    pub output: BuildOutput,
    /// Adapters applied to the payload, empty in `Mode::Direct`
    pub adapters: Vec<String>,
    pub cached: bool,
}

#[derive(Clone)]
pub struct Renderer {
    builders: Arc<BuilderRegistry>,
    adapters: Arc<AdapterRegistry>,
    cache: Arc<RenderCache>,
}

impl Renderer {
    pub fn new(
        builders: Arc<BuilderRegistry>,
        adapters: Arc<AdapterRegistry>,
        cache: Arc<RenderCache>,
    ) -> Self {
        Self {
            builders,
            adapters,
            cache,
        }
    }

    /// Builtin builders, default adapters, no cache.
    pub fn offline() -> Self {
        Self::new(
            Arc::new(BuilderRegistry::with_builtins()),
            Arc::new(AdapterRegistry::with_defaults()),
            Arc::new(RenderCache::disabled()),
        )
    }

    pub fn builders(&self) -> &BuilderRegistry {
        &self.builders
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn render(&self, request: &BuildRequest, mode: Mode) -> Result<Rendered, BuildError> {
        if !self.builders.contains(&request.function_name) {
            return Err(BuildError::UnknownFunction(request.function_name.clone()));
        }

        if mode == Mode::Direct {
            let output = self.builders.build(request)?;
            return Ok(Rendered {
                output,
                adapters: Vec::new(),
                cached: false,
            });
        }

        let key = RenderCache::key(
            &request.function_name,
            request.llm_output.as_deref(),
            &request.backend_output,
        );
        let adapted = self.adapters.normalize(request.backend_output.clone());

        if let Some(output) = self.cache.get(&key) {
            tracing::debug!(function = %request.function_name, "render cache hit");
            return Ok(Rendered {
                output,
                adapters: adapted.applied,
                cached: true,
            });
        }

        let normalized = BuildRequest {
            function_name: request.function_name.clone(),
            llm_output: request.llm_output.clone(),
            backend_output: adapted.value,
        };
        let output = self.builders.build(&normalized)?;
        self.cache.insert(key, output.clone());

        Ok(Rendered {
            output,
            adapters: adapted.applied,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn renderer() -> Renderer {
        Renderer::new(
            Arc::new(BuilderRegistry::with_builtins()),
            Arc::new(AdapterRegistry::with_defaults()),
            Arc::new(RenderCache::new(8, Duration::from_secs(60))),
        )
    }

    #[test]
    fn adapted_mode_unwraps_envelopes() {
        let request = BuildRequest::new(
            "notification",
            json!({"data": {"title": "Hi", "message": "there"}}),
        );
        let rendered = renderer()
            .render(&request, Mode::Adapted)
            .expect("should render");
        assert_eq!(rendered.adapters, vec!["envelope"]);
        assert!(!rendered.cached);
        assert_eq!(rendered.output.widget.fields["title"], "Hi");
    }

    #[test]
    fn direct_mode_does_not_adapt() {
        let request = BuildRequest::new(
            "notification",
            json!({"data": {"title": "Hi", "message": "there"}}),
        );
        let err = renderer()
            .render(&request, Mode::Direct)
            .expect_err("enveloped payload must fail without adapters");
        assert!(matches!(err, BuildError::InvalidInput { .. }));
    }

    #[test]
    fn second_adapted_render_is_served_from_cache() {
        let renderer = renderer();
        let request = BuildRequest::new("notification", json!({"title": "A", "message": "B"}));
        let first = renderer.render(&request, Mode::Adapted).expect("first");
        let second = renderer.render(&request, Mode::Adapted).expect("second");
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.output, second.output);
        assert_eq!(renderer.cache().stats().hits, 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let renderer = renderer();
        let request = BuildRequest::new("notification", json!({"title": "only"}));
        assert!(renderer.render(&request, Mode::Adapted).is_err());
        assert!(renderer.render(&request, Mode::Adapted).is_err());
        assert_eq!(renderer.cache().stats().entries, 0);
    }

    #[test]
    fn unknown_function_skips_cache() {
        let renderer = renderer();
        let err = renderer
            .render(&BuildRequest::new("nope", json!({})), Mode::Adapted)
            .expect_err("unknown");
        assert!(matches!(err, BuildError::UnknownFunction(_)));
        assert_eq!(renderer.cache().stats().misses, 0);
    }
}
