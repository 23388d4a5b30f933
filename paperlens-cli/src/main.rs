use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

// Import from paperlens-core
use paperlens_core::{paper_id_from_path, AnalysisConfig, AnalysisOptions, PaperAnalysis, PaperProcessor};

#[derive(Parser)]
#[command(name = "paperlens")]
#[command(about = "Academic paper analyzer: sections, terminology and importance scores")]
struct Args {
    /// Path to the PDF file to analyze
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// File containing the paper's abstract, used instead of searching the
    /// extracted sections for one
    #[arg(long)]
    abstract_file: Option<String>,

    /// Disable model-based (embedding similarity) scoring
    #[arg(long)]
    no_model: bool,

    /// Disable feedback-based scoring
    #[arg(long)]
    no_feedback: bool,

    /// Record a rating for one section of the input paper and exit.
    /// Requires --rate-score.
    #[arg(long)]
    rate_section: Option<String>,

    /// Rating in [0, 1] to record with --rate-section
    #[arg(long)]
    rate_score: Option<f32>,

    /// Print the most representative sentences of this section after analysis
    #[arg(long)]
    sentences: Option<String>,

    /// Cache directory for extraction and analysis results
    #[arg(long, default_value = "cache")]
    cache_dir: String,

    /// Feedback file location (default: platform data dir)
    #[arg(long)]
    feedback_file: Option<String>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    show_config: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Skip cache and force fresh processing (useful for development/testing)
    #[arg(long)]
    skip_cache: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🦀 Paperlens Paper Analyzer");

    let config = AnalysisConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    if args.show_config {
        println!("\n{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let Some(input) = &args.input else {
        println!("⚠️  No input file given. Use --input <paper.pdf>.");
        return Ok(());
    };
    if !Path::new(input).exists() {
        println!("⚠️  Input PDF not found at: {}", input);
        println!("   Please check the file path.");
        return Ok(());
    }

    let feedback_path = feedback_path(&args);
    let processor = PaperProcessor::new_cli(config.clone(), &args.cache_dir, feedback_path)?;

    // Rating mode: record feedback and exit without running the pipeline
    if let Some(section_title) = &args.rate_section {
        let Some(score) = args.rate_score else {
            eprintln!("❌ --rate-section requires --rate-score");
            std::process::exit(1);
        };
        let paper_id = paper_id_from_path(Path::new(input));
        if processor.add_user_feedback(&paper_id, section_title, score) {
            println!("✅ Recorded rating {:.2} for \"{}\" of {}", score, section_title, paper_id);
            return Ok(());
        }
        eprintln!("❌ Failed to persist the rating");
        std::process::exit(1);
    }

    let abstract_text = match &args.abstract_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let options = AnalysisOptions {
        abstract_text,
        use_model: config.scoring.use_model && !args.no_model,
        use_feedback: config.scoring.use_feedback && !args.no_feedback,
        skip_cache: args.skip_cache,
        enable_profiling: args.profile,
    };

    match processor.analyze_paper_with_options(input, &options) {
        Ok(analysis) => {
            println!("✅ Successfully analyzed paper");
            print_summary(&analysis);

            if let Some(section_title) = &args.sentences {
                print_sentences(&processor, &analysis, section_title, config.scoring.top_n_sentences)?;
            }

            let output_path = output_path(&args, input);
            std::fs::write(&output_path, serde_json::to_string_pretty(&analysis)?)?;
            println!("💾 Analysis saved to: {}", output_path);
        }
        Err(e) => {
            eprintln!("❌ Analysis failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn feedback_path(args: &Args) -> PathBuf {
    if let Some(path) = &args.feedback_file {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paperlens")
        .join("user_feedback.json")
}

fn output_path(args: &Args, input: &str) -> String {
    if let Some(output) = &args.output {
        return output.clone();
    }
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{input_name}_paperlens.json")
}

fn print_summary(analysis: &PaperAnalysis) {
    let metadata = &analysis.structure.metadata;
    if !metadata.title.is_empty() {
        println!("📕 {}", metadata.title);
    }
    println!("📊 Analysis metrics:");
    println!("   - Pages: {}", metadata.page_count);
    println!("   - Sections: {}", analysis.structure.sections.len());
    println!("   - Terms: {}", analysis.terminology.terms.len());
    println!("   - Figures: {}", analysis.structure.potential_figures.len());

    if analysis.structure.sections.is_empty() {
        println!("⚠️  No structure found (the PDF may have no text layer)");
        return;
    }

    // Sections ranked by blended importance
    let mut ranked: Vec<_> = analysis.section_scores.iter().collect();
    ranked.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(std::cmp::Ordering::Equal));
    println!("\n🏆 Section importance:");
    for (title, score) in ranked {
        let mut sources: Vec<_> = score.sources.keys().map(|s| s.as_str()).collect();
        sources.sort_unstable();
        println!("   {:.2}  {} [{}]", score.score, title, sources.join("+"));
    }

    if !analysis.terminology.terms.is_empty() {
        println!("\n🔤 Top terms:");
        for term in analysis.terminology.terms.iter().take(5) {
            match analysis.terminology.definitions.get(&term.term) {
                Some(definition) => println!("   {} ({:.0}): {}", term.term, term.score, definition),
                None => println!("   {} ({:.0})", term.term, term.score),
            }
        }
    }
}

fn print_sentences(
    processor: &PaperProcessor,
    analysis: &PaperAnalysis,
    section_title: &str,
    top_n: usize,
) -> Result<()> {
    let Some(section) = analysis.structure.section(section_title) else {
        println!("⚠️  No section titled \"{}\"", section_title);
        return Ok(());
    };
    println!("\n📌 Key sentences of \"{}\":", section_title);
    for sentence in processor.scorer().get_important_sentences(&section.text, top_n)? {
        println!("   • {}", sentence);
    }
    Ok(())
}
