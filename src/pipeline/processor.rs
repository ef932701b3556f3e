//! Book and document processing.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{AnalysisMode, Analyzer, DependencyAnalyzer, PrefixAnalyzer};
use crate::analysis::parser::{DependencyParser, LazyParser, PrecomputedParser};
use crate::analysis::role::SemanticRole;
use crate::annotation::{AnnotatedFragment, Annotator};
use crate::document::{Document, DocumentRewriter, TextExtractor, TextRun, parser, serializer};
use crate::epub::EpubBook;
use crate::epub::stylesheet::{STYLESHEET_HREF, Stylesheet, link_stylesheet, relative_href};
use crate::error::{BionicError, Result};
use crate::pipeline::config::BionicConfig;

/// Marked segments per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub subject: usize,
    pub predicate: usize,
    pub object: usize,
    pub emphasis: usize,
}

impl RoleCounts {
    pub fn add(&mut self, role: SemanticRole, count: usize) {
        match role {
            SemanticRole::Subject => self.subject += count,
            SemanticRole::Predicate => self.predicate += count,
            SemanticRole::Object => self.object += count,
            SemanticRole::Emphasis => self.emphasis += count,
            SemanticRole::Other => {}
        }
    }

    pub fn merge(&mut self, other: &RoleCounts) {
        self.subject += other.subject;
        self.predicate += other.predicate;
        self.object += other.object;
        self.emphasis += other.emphasis;
    }

    pub fn total(&self) -> usize {
        self.subject + self.predicate + self.object + self.emphasis
    }
}

/// What happened to one content document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Text runs extracted.
    pub text_runs: usize,
    /// Runs replaced by annotated nodes.
    pub annotated_runs: usize,
    /// Characters in all extracted runs.
    pub characters: usize,
    pub segments: RoleCounts,
}

impl DocumentStats {
    fn record(&mut self, run: &TextRun, fragment: &AnnotatedFragment) {
        self.text_runs += 1;
        self.characters += run.text.chars().count();
        for role in SemanticRole::MARKED {
            self.segments.add(role, fragment.count_role(role));
        }
    }

    pub fn merge(&mut self, other: &DocumentStats) {
        self.text_runs += other.text_runs;
        self.annotated_runs += other.annotated_runs;
        self.characters += other.characters;
        self.segments.merge(&other.segments);
    }
}

/// Result of processing a whole book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub mode: String,
    pub analyzer: String,
    /// Content documents processed.
    pub documents: usize,
    pub stats: DocumentStats,
    /// Archive path of the stylesheet.
    pub stylesheet: String,
    pub elapsed_ms: u64,
}

/// Runs extraction, analysis, annotation and rewriting.
pub struct BionicProcessor {
    config: BionicConfig,
    analyzer: Arc<dyn Analyzer>,
    annotator: Annotator,
    thread_pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for BionicProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BionicProcessor")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.name())
            .field("threads", &self.thread_pool.current_num_threads())
            .finish()
    }
}

impl BionicProcessor {
    /// Create a processor with the analyzer selected by `config.mode`.
    ///
    /// The dependency parser is not contacted here; it loads on first use.
    pub fn new(config: BionicConfig) -> Result<Self> {
        let analyzer = build_analyzer(&config);
        Self::with_analyzer(config, analyzer)
    }

    /// Create a processor around an existing analyzer.
    pub fn with_analyzer(config: BionicConfig, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        config.validate()?;

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.thread_count())
            .thread_name(|i| format!("bionic-worker-{i}"))
            .build()
            .map_err(|e| BionicError::internal(format!("Failed to create thread pool: {e}")))?;

        Ok(BionicProcessor {
            annotator: Annotator::new(config.annotation.clone()),
            config,
            analyzer,
            thread_pool: Arc::new(thread_pool),
        })
    }

    pub fn config(&self) -> &BionicConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Analyze and annotate one text run.
    pub fn process_text(&self, text: &str) -> Result<AnnotatedFragment> {
        let analysis = self.analyzer.analyze(text)?;
        self.annotator.annotate(text, &analysis)
    }

    /// Annotate a parsed content document in place.
    pub fn process_document(&self, document: &mut Document) -> Result<DocumentStats> {
        let runs: Vec<TextRun> = TextExtractor::new(document, &self.config.extraction)
            .with_annotation_classes(&self.config.annotation.classes)
            .collect();

        let mut stats = DocumentStats::default();
        let mut edits = Vec::with_capacity(runs.len());
        for run in runs {
            let fragment = self.process_text(&run.text)?;
            stats.record(&run, &fragment);
            edits.push((run, fragment));
        }

        stats.annotated_runs = DocumentRewriter::new(&self.config.annotation).rewrite(document, &edits)?;
        Ok(stats)
    }

    /// Annotate every spine document of `book`.
    ///
    /// Documents are processed in parallel and written back only when all
    /// of them succeeded; on error the book is left as it was.
    pub fn process_book(
        &self,
        book: &mut EpubBook,
        stylesheet: &Stylesheet,
    ) -> Result<ProcessingSummary> {
        let start = Instant::now();
        let documents = book.spine_documents();
        let stylesheet_path = book.resolve(STYLESHEET_HREF);
        let total = documents.len();
        log::info!(
            "Processing {total} documents with the {} analyzer",
            self.analyzer.name()
        );

        let done = AtomicUsize::new(0);
        let source: &EpubBook = book;
        let processed: Result<Vec<(String, Vec<u8>, DocumentStats)>> =
            self.thread_pool.install(|| {
                documents
                    .par_iter()
                    .map(|spine_document| {
                        let path = spine_document.path.as_str();
                        let bytes = source.entry(path).ok_or_else(|| {
                            BionicError::package(format!("spine document {path} is missing"))
                        })?;

                        let mut document = parser::parse_bytes(bytes)?;
                        let stats = self.process_document(&mut document)?;
                        if !link_stylesheet(&mut document, &relative_href(path, &stylesheet_path))? {
                            log::debug!("No stylesheet link added to {path}");
                        }

                        let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                        log::info!(
                            "[{count}/{total}] {path}: {} runs, {} annotated",
                            stats.text_runs,
                            stats.annotated_runs
                        );
                        Ok((path.to_string(), serializer::to_bytes(&document), stats))
                    })
                    .collect()
            });
        let processed = processed?;

        let mut summary = ProcessingSummary {
            mode: self.config.mode.to_string(),
            analyzer: self.analyzer.name().to_string(),
            documents: processed.len(),
            ..Default::default()
        };
        for (path, bytes, stats) in processed {
            summary.stats.merge(&stats);
            book.set_entry(path, bytes);
        }

        summary.stylesheet = book.add_stylesheet(stylesheet)?;
        book.mark_processed(&self.config.title_suffix, &self.config.identifier_suffix)?;

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }

    /// Read `input`, annotate it and save the result to `output`.
    pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        stylesheet: &Stylesheet,
    ) -> Result<ProcessingSummary> {
        let mut book = EpubBook::open(input)?;
        let summary = self.process_book(&mut book, stylesheet)?;
        book.save(output)?;
        Ok(summary)
    }
}

/// The analyzer for `config.mode`.
fn build_analyzer(config: &BionicConfig) -> Arc<dyn Analyzer> {
    match config.mode {
        AnalysisMode::Prefix => Arc::new(PrefixAnalyzer::new()),
        AnalysisMode::Svo => {
            let parser = parser_factory(config);
            Arc::new(
                DependencyAnalyzer::new(parser)
                    .with_scheme(config.relations.clone())
                    .with_argument_span(config.argument_span),
            )
        }
    }
}

fn parser_factory(config: &BionicConfig) -> LazyParser {
    if let Some(path) = config.conllu.clone() {
        return LazyParser::new(move || {
            let parser: Arc<dyn DependencyParser> = Arc::new(PrecomputedParser::from_file(&path)?);
            Ok(parser)
        });
    }

    service_parser(config)
}

#[cfg(feature = "udpipe")]
fn service_parser(config: &BionicConfig) -> LazyParser {
    let udpipe = config.udpipe.clone();
    LazyParser::new(move || {
        let parser: Arc<dyn DependencyParser> =
            Arc::new(crate::analysis::parser::UdpipeParser::connect(udpipe.clone())?);
        Ok(parser)
    })
}

#[cfg(not(feature = "udpipe"))]
fn service_parser(_config: &BionicConfig) -> LazyParser {
    LazyParser::new(|| {
        Err(BionicError::analysis(
            "no dependency parser available: pass a CoNLL-U file or enable the `udpipe` feature",
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::analysis::analyzer::AnalysisResult;
    use crate::epub::fixtures::{CHAPTER, sample_epub};

    const CONLLU: &str = "# text = 他吃了苹果。\n\
        1\t他\t他\tPRON\tPN\t_\t2\tnsubj\t_\t_\n\
        2\t吃\t吃\tVERB\tVV\t_\t0\troot\t_\t_\n\
        3\t了\t了\tAUX\tAS\t_\t2\taux\t_\t_\n\
        4\t苹果\t苹果\tNOUN\tNN\t_\t2\tobj\t_\t_\n\
        5\t。\t。\tPUNCT\tPU\t_\t2\tpunct\t_\t_\n";

    fn svo_processor() -> BionicProcessor {
        let parser = Arc::new(PrecomputedParser::from_conllu(CONLLU).unwrap());
        BionicProcessor::with_analyzer(
            BionicConfig::default().with_threads(2),
            Arc::new(DependencyAnalyzer::with_parser(parser)),
        )
        .unwrap()
    }

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        fn analyze(&self, _text: &str) -> Result<AnalysisResult> {
            Err(BionicError::analysis("service down"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn test_process_text() {
        let fragment = svo_processor().process_text("他吃了苹果。").unwrap();
        assert_eq!(fragment.text(), "他吃了苹果。");
        assert_eq!(fragment.count_role(SemanticRole::Subject), 1);
        assert_eq!(fragment.count_role(SemanticRole::Predicate), 1);
        assert_eq!(fragment.count_role(SemanticRole::Object), 1);
    }

    #[test]
    fn test_process_document_prefix() {
        let processor =
            BionicProcessor::new(BionicConfig::default().with_mode(AnalysisMode::Prefix).with_threads(1))
                .unwrap();
        let mut document = parser::parse_str(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Reading</title></head><body><p class="x">reading <i>fast</i></p><pre>code</pre></body></html>"#,
        )
        .unwrap();

        let stats = processor.process_document(&mut document).unwrap();
        assert_eq!(stats.text_runs, 2);
        assert_eq!(stats.annotated_runs, 2);
        assert_eq!(stats.segments.emphasis, 2);

        let out = serializer::to_string(&document);
        assert!(out.contains(
            "<p class=\"x\"><span class=\"bionic-emphasis\">rea</span>ding <i><span class=\"bionic-emphasis\">fa</span>st</i></p>"
        ));
        assert!(out.contains("<title>Reading</title>"));
        assert!(out.contains("<pre>code</pre>"));
    }

    #[test]
    fn test_process_book() {
        let mut book = EpubBook::from_reader(Cursor::new(sample_epub())).unwrap();
        let summary = svo_processor()
            .process_book(&mut book, &Stylesheet::default())
            .unwrap();

        assert_eq!(summary.documents, 1);
        assert_eq!(summary.stats.annotated_runs, 1);
        assert_eq!(summary.stats.segments.total(), 3);
        assert_eq!(summary.stylesheet, "OEBPS/style/bionic-styles.css");

        let chapter = String::from_utf8(book.entry("OEBPS/text/c1.xhtml").unwrap().to_vec()).unwrap();
        assert!(chapter.contains(
            "<p><span class=\"svo-subject\">他</span><span class=\"svo-predicate\">吃</span>了<span class=\"svo-object\">苹果</span>。</p>"
        ));
        assert!(chapter.contains("href=\"../style/bionic-styles.css\""));
        assert!(chapter.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(book.package().item("bionic-styles").is_some());
        assert_eq!(book.package().title().as_deref(), Some("示例书 (Bionic)"));
    }

    #[test]
    fn test_failure_leaves_book_untouched() {
        let mut book = EpubBook::from_reader(Cursor::new(sample_epub())).unwrap();
        let processor = BionicProcessor::with_analyzer(
            BionicConfig::default().with_threads(1),
            Arc::new(FailingAnalyzer),
        )
        .unwrap();

        let err = processor
            .process_book(&mut book, &Stylesheet::default())
            .unwrap_err();
        assert!(err.is_analysis());
        assert_eq!(book.entry("OEBPS/text/c1.xhtml"), Some(CHAPTER.as_bytes()));
        assert!(book.package().item("bionic-styles").is_none());
    }

    #[test]
    fn test_unknown_sentence_is_analysis_error() {
        let err = svo_processor().process_text("完全不同的句子。").unwrap_err();
        assert!(err.is_analysis());
    }

    #[test]
    fn test_role_counts() {
        let mut counts = RoleCounts::default();
        counts.add(SemanticRole::Subject, 2);
        counts.add(SemanticRole::Other, 5);
        let mut total = RoleCounts::default();
        total.merge(&counts);
        total.merge(&counts);
        assert_eq!(total.subject, 4);
        assert_eq!(total.total(), 4);
    }
}
