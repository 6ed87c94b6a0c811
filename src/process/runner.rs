//! Transform runner: applies a pipeline's stages to a document in order.
//!
//! Stages are resolved against a [`Registry`] once, when the runner is
//! built. Running is a single linear pass: each stage consumes the
//! previous stage's document, and the first failure ends the run.

use std::fmt;

use crate::diagnostic::{ConfigError, PipelineError};
use crate::document::Document;
use crate::pipeline::Pipeline;
use crate::transform::{import, minify, Registry, Transform, BUILTIN_REGISTRY};

/// A pipeline with every stage instantiated.
///
/// `Runner` is `Send + Sync`; one instance can serve many parallel builds.
///
/// # Example
///
/// ```ignore
/// let runner = Runner::new(&Pipeline::standard())?;
/// let output = runner.run(Document::new("main.css", source))?;
/// ```
pub struct Runner {
    stages: Vec<Box<dyn Transform>>,
}

impl Runner {
    /// Resolve a pipeline against the built-in stages.
    pub fn new(pipeline: &Pipeline) -> Result<Self, ConfigError> {
        Self::with_registry(pipeline, &BUILTIN_REGISTRY)
    }

    /// Resolve a pipeline against a custom registry.
    pub fn with_registry(pipeline: &Pipeline, registry: &Registry) -> Result<Self, ConfigError> {
        warn_on_ordering(pipeline);

        let stages = pipeline
            .stages()
            .iter()
            .map(|stage| registry.create(stage))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { stages })
    }

    /// Number of stages.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the runner has no stages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in run order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    /// Apply every stage in order.
    ///
    /// An empty runner returns the input unchanged.
    pub fn run(&self, input: Document) -> Result<Document, PipelineError> {
        self.stages.iter().try_fold(input, |doc, stage| {
            let path = doc.path().to_path_buf();
            let before = doc.len();

            let output = stage.apply(doc).map_err(|cause| {
                log::debug!("{}: stage `{}` failed: {cause}", path.display(), stage.name());
                PipelineError::StageFailed {
                    stage: stage.name().to_string(),
                    cause,
                }
            })?;

            log::debug!(
                "{}: {} {} -> {} bytes",
                path.display(),
                stage.name(),
                before,
                output.len()
            );
            Ok(output)
        })
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("stages", &self.stage_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Run a pipeline over one document with the built-in stages.
///
/// Resolves the pipeline on every call; build a [`Runner`] to reuse it.
pub fn run(pipeline: &Pipeline, input: Document) -> Result<Document, PipelineError> {
    Runner::new(pipeline)?.run(input)
}

/// Minifying before inlining leaves the imported stylesheets unminified.
fn warn_on_ordering(pipeline: &Pipeline) {
    if let Some(minify_at) = pipeline.position(minify::NAME)
        && let Some(import_at) = pipeline.position(import::NAME)
        && minify_at < import_at
    {
        log::warn!(
            "stage `{}` runs before `{}`; imported stylesheets will not be minified",
            minify::NAME,
            import::NAME
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::StageError;
    use crate::pipeline::Stage;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    struct Append(&'static str);

    impl Transform for Append {
        fn name(&self) -> &str {
            "append"
        }

        fn apply(&self, input: Document) -> Result<Document, StageError> {
            let content = format!("{}{}", input.content(), self.0);
            Ok(input.with_content(content))
        }
    }

    struct Fail;

    impl Transform for Fail {
        fn name(&self) -> &str {
            "fail"
        }

        fn apply(&self, _input: Document) -> Result<Document, StageError> {
            Err(StageError::custom("boom"))
        }
    }

    fn test_registry() -> Registry {
        let mut registry = Registry::with_builtins();
        registry.register("append", |options| {
            let suffix = match options.get("suffix").and_then(|v| v.as_str()) {
                Some("b") => "b",
                _ => "a",
            };
            Ok(Box::new(Append(suffix)) as Box<dyn Transform>)
        });
        registry.register("fail", |_| Ok(Box::new(Fail) as Box<dyn Transform>));
        registry
    }

    #[test]
    fn test_import_then_minify() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), ".x{margin:0;}").unwrap();
        let doc = Document::new(dir.path().join("main.css"), "@import 'a.css'; body{color:red;}");

        let pipeline = Pipeline::builder().stage("import-inline").stage("minify").build().unwrap();
        let output = run(&pipeline, doc).unwrap();
        assert_eq!(output.content(), ".x{margin:0}body{color:red}");
        assert!(!output.content().contains("@import"));
    }

    #[test]
    fn test_remote_import_stays_valid_after_minify() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "a{x:y}").unwrap();
        fs::write(dir.path().join("b.css"), "@import url(https://fonts.example/f.css);\nb{x:y}").unwrap();
        let doc = Document::new(dir.path().join("main.css"), "@import 'a';\n@import 'b' print;\nc{x:y}");

        let output = run(&Pipeline::standard(), doc).unwrap();
        assert_eq!(
            output.content(),
            "@import url(https://fonts.example/f.css) print;a{x:y}@media print{b{x:y}}c{x:y}"
        );
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::builder()
            .stage("append")
            .stage(Stage::new("append").with_option("suffix", "b").repeated())
            .build()
            .unwrap();
        let runner = Runner::with_registry(&pipeline, &test_registry()).unwrap();

        assert_eq!(runner.stage_names().collect::<Vec<_>>(), ["append", "append"]);
        let output = runner.run(Document::new("x.css", "")).unwrap();
        assert_eq!(output.content(), "ab");
    }

    #[test]
    fn test_first_failure_stops_run() {
        let pipeline = Pipeline::builder().stage("fail").stage("append").build().unwrap();
        let runner = Runner::with_registry(&pipeline, &test_registry()).unwrap();

        let err = runner.run(Document::new("x.css", "a{}")).unwrap_err();
        assert_eq!(err.stage(), Some("fail"));
        assert!(matches!(err, PipelineError::StageFailed { cause: StageError::Custom(_), .. }));
    }

    #[test]
    fn test_unresolved_import_is_stage_failure() {
        let dir = TempDir::new().unwrap();
        let doc = Document::new(dir.path().join("main.css"), "@import 'nope';");
        let err = run(&Pipeline::standard(), doc).unwrap_err();
        assert_eq!(err.stage(), Some("import-inline"));
    }

    #[test]
    fn test_unknown_stage_is_config_error() {
        let pipeline = Pipeline::builder().stage("autoprefix").build().unwrap();
        let err = run(&pipeline, Document::new("x.css", "")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(ConfigError::UnknownStage { .. })));
    }

    #[test]
    fn test_reverse_order_still_runs() {
        let pipeline = Pipeline::builder().stage("minify").stage("import-inline").build().unwrap();
        let output = run(&pipeline, Document::new("x.css", "a { color : red ; }")).unwrap();
        assert_eq!(output.content(), "a{color:red}");
    }

    /// Odd-numbered files are partials, so imports also exercise the prefix.
    fn import_file_name(i: usize) -> String {
        if i % 2 == 1 { format!("_f{i}.css") } else { format!("f{i}.css") }
    }

    fn import_statement(j: usize, form: usize) -> String {
        match form {
            0 => format!("@import 'f{j}';\n"),
            1 => format!("@import \"f{j}.css\" print;\n"),
            2 => format!("@import url(f{j}.css) layer(l{j});\n"),
            _ => format!("@import url('f{j}') supports(display: grid) screen;\n"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_resolvable_imports_are_all_inlined(
            files in prop::collection::vec((prop::collection::vec(any::<bool>(), 6), 0usize..4), 1..6),
            entry_links in prop::collection::vec(any::<bool>(), 6),
        ) {
            let dir = TempDir::new().unwrap();
            let n = files.len();

            // File i only imports files after it, so the graph has no cycles.
            for (i, (links, form)) in files.iter().enumerate() {
                let mut css: String = ((i + 1)..n)
                    .filter(|&j| links[j])
                    .map(|j| import_statement(j, *form))
                    .collect();
                css.push_str(&format!(".f{i} {{ margin: 0px }}\n"));
                fs::write(dir.path().join(import_file_name(i)), css).unwrap();
            }

            let mut entry: String = (0..n)
                .filter(|&j| entry_links[j])
                .map(|j| import_statement(j, j % 4))
                .collect();
            entry.push_str("body { color: red }");

            let output = run(&Pipeline::standard(), Document::new(dir.path().join("main.css"), entry)).unwrap();
            prop_assert!(!output.content().contains("@import"), "{}", output.content());
            prop_assert!(output.content().ends_with("body{color:red}"), "{}", output.content());
        }
    }

    proptest! {
        #[test]
        fn prop_empty_pipeline_is_identity(content in any::<String>(), name in "[a-z]{1,8}\\.css") {
            let input = Document::new(&name, content);
            let output = run(&Pipeline::empty(), input.clone()).unwrap();
            prop_assert_eq!(output, input);
        }
    }
}
