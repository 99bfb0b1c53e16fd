use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use talktodocs::{
    backend::{BackendClient, Model, SummarySource},
    config,
    document::UploadedFile,
    logging, render,
    session::{DocumentChat, SessionError, SummaryPipeline},
    speech::{SpeechClient, SpeechError},
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "talktodocs",
    about = "Upload a PDF, ask questions about it, or get a summary with study questions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Llama,
    Custom,
}

impl From<ModelArg> for Model {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::Llama => Model::Llama,
            ModelArg::Custom => Model::Custom,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a document, then answer questions read from stdin (one per line).
    Chat {
        #[arg(long)]
        file: PathBuf,
        /// Backend model attached to each query; defaults to TALKTODOCS_MODEL.
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
    },
    /// Summarize a document and list generated study questions.
    Summarize {
        #[arg(long)]
        file: PathBuf,
        /// Summarization model; defaults to TALKTODOCS_MODEL.
        #[arg(long, value_enum, conflicts_with = "ocr")]
        model: Option<ModelArg>,
        /// Treat the document as scanned or handwritten.
        #[arg(long)]
        ocr: bool,
        /// Show answers under each question.
        #[arg(long)]
        expand: bool,
        /// Synthesize the summary and write the audio to this path.
        #[arg(long)]
        audio: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    config::load_env_file();
    logging::init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    let backend = BackendClient::from_config(config).context("failed to build backend client")?;

    match cli.command {
        Command::Chat { file, model } => {
            let model = config.model_or_default(model.map(Model::from));
            chat(&backend, file, model).await
        }
        Command::Summarize {
            file,
            model,
            ocr,
            expand,
            audio,
        } => {
            let source = if ocr {
                SummarySource::Ocr
            } else {
                SummarySource::Uploaded(config.model_or_default(model.map(Model::from)))
            };
            summarize(config, &backend, file, source, expand, audio).await
        }
    }
}

async fn chat(backend: &BackendClient, path: PathBuf, model: Model) -> Result<()> {
    let file = load(&path).await?;
    println!("{} ({})", file.name(), file.size_label());

    let mut session = DocumentChat::new(Some(model));
    session.select(file);
    println!("Processing...");
    session
        .process(backend)
        .await
        .context("document could not be processed")?;
    print!("{}", render::render_transcript(session.chat().turns()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let outcome = session.ask(backend, &line).await.map(|_| ());
        match outcome {
            Ok(()) | Err(SessionError::Stage(_)) => {
                if let Some(turn) = session.chat().turns().last() {
                    print!("{}", render::render_turn(turn));
                }
            }
            Err(SessionError::EmptyQuery) => continue,
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

async fn summarize(
    config: &config::Config,
    backend: &BackendClient,
    path: PathBuf,
    source: SummarySource,
    expand: bool,
    audio: Option<PathBuf>,
) -> Result<()> {
    let file = load(&path).await?;
    let mut pipeline = SummaryPipeline::new(source);
    pipeline.select(file);

    let outcome = pipeline.process(backend).await;
    if expand {
        for index in 0..pipeline.questions().len() {
            pipeline.toggle_question(index);
        }
    }
    print!("{}", render::render_summary(&pipeline));
    eprint!("{}", render::render_errors(pipeline.errors()));
    outcome.context("summary could not be generated")?;

    if let Some(target) = audio {
        let Some(speech) = SpeechClient::from_config(config) else {
            bail!(SpeechError::Disabled);
        };
        let speech = speech.context("failed to build speech client")?;
        pipeline
            .generate_audio(&speech)
            .await
            .context("audio could not be generated")?
            .save(&target)
            .await
            .with_context(|| format!("failed to write audio to {}", target.display()))?;
        println!("Audio saved to {}", target.display());
    }
    Ok(())
}

async fn load(path: &Path) -> Result<UploadedFile> {
    UploadedFile::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
