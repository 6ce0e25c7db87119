// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: wires configuration, bridge, engine and AI services into
// one run and delivers its outputs.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use visusynth_bridge::{DownloadSink, PlatformBridge, StubBridge};
use visusynth_core::config::{EngineBackend, EngineConfig, PipelineConfig};
use visusynth_core::error::Result;
use visusynth_core::human_errors::humanize_error;
use visusynth_core::{InputImage, RunSnapshot};
use visusynth_document::export::ExportArtifact;
use visusynth_pipeline::{
    AiCorrector, AiGateway, AiSummarizer, Orchestrator, PipelineRun, RecognitionEngine,
    ReviewSession, TesseractEngine,
};

use crate::cli::Args;
use crate::config_dir::default_config_path;

/// Process every file named in `args` and write the outputs.
pub async fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = PipelineConfig::load(&config_path)?;
    args.apply_to(&mut config);
    config.validate()?;

    let inputs = args
        .files
        .iter()
        .map(InputImage::from_path)
        .collect::<Result<Vec<_>>>()?;

    let bridge = Arc::new(StubBridge::new(&args.out));
    info!(platform = bridge.platform_name(), files = inputs.len(), "starting batch");

    let gateway = AiGateway::from_config(&config.gateway);
    let mut orchestrator = Orchestrator::new(build_engine(&config.engine)?, bridge.clone());
    if config.features.ai_correction {
        orchestrator = orchestrator.with_corrector(Arc::new(AiCorrector::new(gateway.clone())));
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current file");
            on_interrupt.cancel();
        }
    });

    let mut pipeline_run = PipelineRun::new(inputs);
    let progress = tokio::spawn(print_progress(pipeline_run.subscribe()));
    let outcome = orchestrator.execute(&mut pipeline_run, &config, &cancel).await;
    drop(pipeline_run);
    join_progress(progress).await;
    let output = outcome?;

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }

    let review = ReviewSession::new(&output, config.layout)
        .with_summarizer(Arc::new(AiSummarizer::new(gateway)));

    deliver(bridge.as_ref(), review.export_text())?;
    deliver(bridge.as_ref(), review.export_markdown())?;
    match review.render_pdf() {
        Ok(pdf) => deliver(bridge.as_ref(), pdf)?,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("warning: {} {}", human.message, human.suggestion);
        }
    }

    let info = review.info();
    println!(
        "Processed {} file(s) in {}: {} characters",
        info.files_processed,
        info.language.display_name(),
        info.characters
    );

    if args.summarize {
        match review.summarize().await {
            Ok(summary) => println!("\nSummary:\n{summary}"),
            Err(err) => {
                let human = humanize_error(&err);
                eprintln!("warning: {} {}", human.message, human.suggestion);
            }
        }
    }
    Ok(())
}

fn build_engine(engine: &EngineConfig) -> Result<Arc<dyn RecognitionEngine>> {
    match engine.backend {
        EngineBackend::Tesseract => Ok(Arc::new(TesseractEngine::default())),
        #[cfg(feature = "ocr")]
        EngineBackend::Ocrs => Ok(Arc::new(match &engine.model_dir {
            Some(dir) => visusynth_pipeline::OcrsEngine::from_dir(dir.clone()),
            None => visusynth_pipeline::OcrsEngine::default(),
        })),
        #[cfg(not(feature = "ocr"))]
        EngineBackend::Ocrs => Err(visusynth_core::VisusynthError::Config(
            "this build has no ocrs support; rebuild with --features ocr or use tesseract".into(),
        )),
    }
}

fn deliver(sink: &dyn DownloadSink, artifact: ExportArtifact) -> Result<()> {
    let path = sink.save_download(&artifact.file_name, artifact.mime_type, &artifact.bytes)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Wait for the progress printer, logging it if it panicked or was aborted.
/// Returns whether it finished normally.
async fn join_progress(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "progress printer stopped abnormally");
            false
        }
    }
}

/// Print each new step label until the run reaches a terminal stage.
async fn print_progress(mut rx: watch::Receiver<RunSnapshot>) {
    let mut last_label = String::new();
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.label != last_label {
            eprintln!("[{:>3}%] {}", snapshot.progress, snapshot.label);
            last_label = snapshot.label;
        }
        if snapshot.stage.is_terminal() {
            break;
        }
    }
}
