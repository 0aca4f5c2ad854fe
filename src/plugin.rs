use tracing::{debug, trace};

use crate::annotate::{AnnotateStats, Annotator};
use crate::config::Options;
use crate::context::PipelineContext;
use crate::errors::{PluginError, Result};
use crate::files::FileCollection;
use crate::graph::ParentRef;
use crate::matcher::PathMatcher;

/// Completion callback handed to a middleware. Must be called exactly once.
pub type Done<'a> = Box<dyn FnOnce(Result<()>) + 'a>;

/// A build step operating on the file collection.
pub trait Middleware {
    fn name(&self) -> &'static str;
    fn run(&self, files: &mut FileCollection, ctx: &PipelineContext, done: Done<'_>);
}

/// Annotates every selected file with parent links and existence markers.
#[derive(Debug, Clone)]
pub struct MustacheMetadata {
    matcher: PathMatcher,
}

/// Builds the middleware. Fails only on an invalid `match` pattern.
pub fn mustache_metadata(options: Options) -> Result<MustacheMetadata> {
    MustacheMetadata::new(&options)
}

impl MustacheMetadata {
    pub fn new(options: &Options) -> Result<Self> {
        Ok(Self {
            matcher: options.matcher()?,
        })
    }

    /// Annotates each matching file as a root, in path order, within one pass.
    pub fn annotate_files(&self, files: &mut FileCollection) -> AnnotateStats {
        let (entries, graph) = files.split_mut();
        let mut annotator = Annotator::new(graph);
        let mut selected = 0usize;
        for (path, id) in entries {
            if self.matcher.matches(path) {
                debug!(path = %path, "annotating file");
                annotator.annotate(id, ParentRef::Root, true);
                selected += 1;
            } else {
                trace!(path = %path, "not selected");
            }
        }
        let stats = annotator.finish();
        debug!(
            selected,
            nodes = stats.nodes,
            markers = stats.markers,
            revisits = stats.revisits,
            "annotation pass complete"
        );
        stats
    }
}

impl Middleware for MustacheMetadata {
    fn name(&self) -> &'static str {
        "mustache-metadata"
    }

    #[tracing::instrument(
        skip_all,
        fields(pattern = %self.matcher.pattern(), files = files.len())
    )]
    fn run(&self, files: &mut FileCollection, _ctx: &PipelineContext, done: Done<'_>) {
        self.annotate_files(files);
        done(Ok(()));
    }
}

/// Runs middlewares in registration order.
#[derive(Default)]
pub struct Pipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.register(middleware);
        self
    }

    pub fn register<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Stops at the first middleware reporting an error or never calling `done`.
    pub fn run(&self, files: &mut FileCollection, ctx: &PipelineContext) -> Result<()> {
        for middleware in &self.middlewares {
            let mut outcome: Option<Result<()>> = None;
            middleware.run(files, ctx, Box::new(|res: Result<()>| outcome = Some(res)));
            match outcome {
                Some(res) => res?,
                None => return Err(PluginError::Incomplete(middleware.name())),
            }
            trace!(middleware = middleware.name(), "middleware done");
        }
        Ok(())
    }
}
