/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */


mod ocr;
mod srt;

use ocr::{Recognizer, TesseractCommand};
use srt::{write_srt, SrtEntry};
use pgsdecode::{
    format_timestamp,
    Cue,
    DecodeOptions,
    DisplaySet,
    ReadDisplaySetExt,
    TruncationPolicy,
    bitmap::{encode_png, flatten},
    displayset::ReadError as DisplaySetReadError,
};
use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter, Error as IoError, Write},
    path::{Path, PathBuf},
    process::exit,
    sync::{mpsc, Arc},
};
use clap::{
    app_from_crate,
    crate_authors,
    crate_description,
    crate_name,
    crate_version,
    value_t,
    Arg,
    ArgMatches,
};
use image::Rgb;
use thiserror::Error as ThisError;
use threadpool::ThreadPool;

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(ThisError, Debug)]
enum RunError {
    #[error("could not open input file {path}")]
    OpenInput {
        path: String,
        source: IoError,
    },
    #[error("could not decode input stream")]
    Decode {
        #[from]
        source: DisplaySetReadError,
    },
    #[error("could not write output file {path}")]
    WriteOutput {
        path: String,
        source: IoError,
    },
}

struct Settings {
    input: PathBuf,
    output: PathBuf,
    options: DecodeOptions,
    jobs: usize,
    tesseract: TesseractCommand,
}

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("language")
            .long("language")
            .short("l")
            .value_name("LANG")
            .help("Tesseract language used for recognition")
            .takes_value(true)
            .default_value("eng")
        )
        .arg(Arg::with_name("tesseract")
            .long("tesseract")
            .value_name("PROGRAM")
            .help("Path of the tesseract executable")
            .takes_value(true)
            .default_value("tesseract")
        )
        .arg(Arg::with_name("jobs")
            .long("jobs")
            .short("j")
            .value_name("COUNT")
            .help("Number of images to recognize at once; defaults to the number of CPUs")
            .takes_value(true)
            .validator(|value| {
                match value.parse::<usize>() {
                    Ok(count) if count > 0 => Ok(()),
                    _ => Err("must be a positive integer".to_string()),
                }
            })
        )
        .arg(Arg::with_name("fallback-duration")
            .long("fallback-duration")
            .short("f")
            .value_name("MILLISECONDS")
            .help("How long the last subtitle of an epoch stays on screen")
            .takes_value(true)
            .default_value("5000")
            .validator(|value| {
                if value.parse::<u32>().is_ok() {
                    Ok(())
                } else {
                    Err("must be an unsigned integer".to_string())
                }
            })
        )
        .arg(Arg::with_name("strict")
            .long("strict")
            .help("Skip compositions and window definitions that hold fewer entries than declared")
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file")
            .required(true)
        )
        .arg(Arg::with_name("output")
            .index(2)
            .value_name("OUTPUT-FILE")
            .help("Output SRT file; defaults to the input file with an .srt extension")
        )
        .after_help(format!("This utility will convert PGS subtitles into SubRip text by \
            recognizing each subtitle image with Tesseract.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Open Software License version 3.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let settings = settings(&matches);

    if let Err(err) = run(&settings) {
        log::error!("{}", describe(&err));
        exit(1);
    }
}

fn settings(matches: &ArgMatches) -> Settings {

    let input = value_t!(matches, "input", PathBuf).unwrap_or_else(|err| err.exit());
    let output = match matches.value_of("output") {
        Some(output) => PathBuf::from(output),
        None => output_path(&input),
    };
    let jobs = if matches.is_present("jobs") {
        value_t!(matches, "jobs", usize).unwrap_or_else(|err| err.exit())
    } else {
        num_cpus::get()
    };
    let fallback_duration_ms = value_t!(matches, "fallback-duration", u32)
        .unwrap_or_else(|err| err.exit());
    let truncated_lists = if matches.is_present("strict") {
        TruncationPolicy::Reject
    } else {
        TruncationPolicy::Degrade
    };
    let tesseract = TesseractCommand::new(
        matches.value_of("tesseract").unwrap_or("tesseract"),
        matches.value_of("language").unwrap_or("eng"),
    );

    Settings {
        input,
        output,
        options: DecodeOptions::new()
            .with_fallback_duration_ms(fallback_duration_ms)
            .with_truncated_lists(truncated_lists),
        jobs,
        tesseract,
    }
}

fn run(settings: &Settings) -> Result<(), RunError> {

    log::info!("reading {}", settings.input.display());

    let input = File::open(&settings.input).map_err(|source| {
        RunError::OpenInput {
            path: settings.input.display().to_string(),
            source,
        }
    })?;
    let decoded = BufReader::new(input).read_presentation(&settings.options)?;

    if !decoded.findings.is_empty() {
        log::warn!("tolerated {} problems in the input stream", decoded.findings.len());
    }

    let cues = decoded.presentation.cues(settings.options.fallback_duration_ms);
    let display_sets = decoded.presentation.display_sets;

    log::info!("recognizing {} subtitles with {} jobs", cues.len(), settings.jobs);

    let texts = recognize_all(
        display_sets,
        &cues,
        Arc::new(settings.tesseract.clone()),
        settings.jobs,
    );
    let entries = cues.iter()
        .zip(texts)
        .map(|(cue, text)| {
            SrtEntry {
                index: cue.index,
                start: cue.start,
                end: cue.end,
                text,
            }
        })
        .collect::<Vec<_>>();
    let write_error = |source: IoError| {
        RunError::WriteOutput {
            path: settings.output.display().to_string(),
            source,
        }
    };

    log::info!("writing {}", settings.output.display());

    let mut output = BufWriter::new(File::create(&settings.output).map_err(write_error)?);

    write_srt(&mut output, &entries).map_err(write_error)?;
    output.flush().map_err(write_error)?;

    log::info!("wrote {} subtitles", entries.len());

    Ok(())
}

/// Replaces the extension of `input` with `srt`.
fn output_path(input: &Path) -> PathBuf {
    input.with_extension("srt")
}

/// Recognizes the text of every cue on a pool of `jobs` threads. The returned texts are in cue
/// order; a cue whose recognition failed entirely gets empty text.
fn recognize_all(
    display_sets: Vec<DisplaySet>,
    cues: &[Cue],
    recognizer: Arc<dyn Recognizer>,
    jobs: usize,
) -> Vec<String> {

    let pool = ThreadPool::new(jobs.max(1));
    let display_sets = Arc::new(display_sets);
    let (sender, receiver) = mpsc::channel();

    for (position, cue) in cues.iter().enumerate() {

        let display_sets = Arc::clone(&display_sets);
        let recognizer = Arc::clone(&recognizer);
        let sender = sender.clone();
        let index = cue.display_set;

        pool.execute(move || {
            if let Some(display_set) = display_sets.get(index) {
                let text = recognize_display_set(display_set, recognizer.as_ref());
                sender.send((position, text)).ok();
            }
        });
    }

    drop(sender);

    let mut texts = vec![String::new(); cues.len()];

    for (position, text) in receiver.iter() {
        texts[position] = text;
    }

    texts
}

/// Recognizes every active object of a display set and joins their texts with line breaks.
/// Objects that cannot be rendered or recognized are logged and left out.
fn recognize_display_set(display_set: &DisplaySet, recognizer: &dyn Recognizer) -> String {

    let timestamp = format_timestamp(display_set.pts);
    let mut lines = Vec::new();

    for rendered in display_set.render() {

        let png = match rendered.image.and_then(|image| encode_png(&flatten(&image, BACKGROUND))) {
            Ok(png) => png,
            Err(err) => {
                log::warn!("{}: skipping object {}: {}", timestamp, rendered.object_id, err);
                continue
            }
        };

        match recognizer.recognize(&png) {
            Ok(text) if text.is_empty() => {
                log::debug!("{}: no text found in object {}", timestamp, rendered.object_id);
            }
            Ok(text) => {
                lines.push(text);
            }
            Err(err) => {
                log::warn!("{}: {}: {}", timestamp, rendered.object_id, describe(&err));
            }
        }
    }

    lines.join("\n")
}

/// Renders an error followed by all of its sources.
fn describe(err: &dyn Error) -> String {

    let mut description = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }

    description
}
