/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgsdecode::{
    format_timestamp,
    DecodeOptions,
    DisplaySet,
    EpochEngine,
    Finding,
    Presentation,
    segment::{
        CompositionState,
        RawSegment,
        ReadSegmentExt,
        Segment,
        SegmentBody,
    },
};
use std::{
    fs::File,
    io::{stdin, BufReader, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};

fn main() {

    env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("display-sets")
            .long("display-sets")
            .short("d")
            .help("Print assembled display sets instead of individual segments")
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will dump PGS subtitle bitstream data.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let input_value = matches.value_of("input").unwrap_or("-");
    let (mut stdin_read, mut file_read);
    let mut input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = match File::open(input_value) {
                Ok(file) => file,
                Err(err) => {
                    log::error!("could not open input file: {}", err);
                    exit(1)
                }
            };
            &mut file_read
        }
    );
    let options = DecodeOptions::default();
    let mut engine = EpochEngine::new(options.clone());
    let mut display_sets = Vec::new();
    let mut reported = 0;
    let show_display_sets = matches.is_present("display-sets");

    eprintln!("Iterating through PGS segments...");

    loop {

        let raw = match input.read_raw_segment() {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(err) => {
                log::error!("could not read segment: {}", err);
                exit(1)
            }
        };

        if !show_display_sets {
            print_raw_segment(&raw, &options);
        }

        match engine.push_segment(&raw) {
            Ok(Some(display_set)) => display_sets.push(display_set),
            Ok(None) => (),
            Err(err) => {
                log::error!("could not decode segment: {}", err);
                exit(1)
            }
        }

        if !show_display_sets {
            print_findings(&engine.findings()[reported..]);
            reported = engine.findings().len();
        }
    }

    let (last, findings) = engine.finish();

    display_sets.extend(last);

    if show_display_sets {
        print_display_sets(&Presentation::new(display_sets), options.fallback_duration_ms);
        print_findings(&findings);
    } else {
        print_findings(&findings[reported..]);
    }
}

fn print_raw_segment(raw: &RawSegment, options: &DecodeOptions) {

    let header = &raw.header;
    let kind = match header.kind() {
        Some(kind) => kind.to_string(),
        None => format!("0x{:02X}", header.code),
    };

    println!("segment {} ({})", kind, format_timestamp(header.pts));
    println!("  dts = {}", format_timestamp(header.dts));
    println!("  size = {}", header.size);

    if raw.is_truncated() {
        println!("  truncated = [{}]", raw.payload.len());
        println!();
        return
    }

    // Findings are reported by the engine instead.
    let mut issues = Vec::new();

    if let Ok(segment) = raw.decode(None, options, &mut issues) {
        print_segment(&segment);
    }

    println!();
}

fn print_segment(segment: &Segment) {

    match &segment.body {
        SegmentBody::PresentationComposition(pcs) => {
            println!("  width = {}", pcs.width);
            println!("  height = {}", pcs.height);
            println!("  frame_rate = 0x{:02X}", pcs.frame_rate);
            println!("  composition_number = {}", pcs.composition_number);
            println!("  composition_state = {}", match pcs.composition_state {
                CompositionState::EpochStart => "EPOCH_START".to_string(),
                CompositionState::Normal => "NORMAL_CASE".to_string(),
                CompositionState::AcquisitionPoint => "ACQUISITION_POINT".to_string(),
                CompositionState::Reserved(byte) => format!("RESERVED(0x{:02X})", byte),
            });
            if pcs.palette_update {
                println!("  palette_update_id = {}", pcs.palette_id);
            }
            for comp_obj in pcs.composition_objects.iter() {
                println!("  composition_object");
                println!("    object_id = {}", comp_obj.object_id);
                println!("    window_id = {}", comp_obj.window_id);
                println!("    object_horizontal_position = {}", comp_obj.x);
                println!("    object_vertical_position = {}", comp_obj.y);
                if let Some(crop) = &comp_obj.crop {
                    println!("    object_cropping_horizontal_position = {}", crop.x);
                    println!("    object_cropping_vertical_position = {}", crop.y);
                    println!("    object_cropping_width = {}", crop.width);
                    println!("    object_cropping_height = {}", crop.height);
                }
            }
        }
        SegmentBody::WindowDefinition(windows) => {
            for window in windows.iter() {
                println!("  window");
                println!("    window_id = {}", window.id);
                println!("    window_horizontal_position = {}", window.x);
                println!("    window_vertical_position = {}", window.y);
                println!("    window_width = {}", window.width);
                println!("    window_height = {}", window.height);
            }
        }
        SegmentBody::PaletteDefinition(palette) => {
            println!("  palette_id = {}", palette.id);
            println!("  palette_version = {}", palette.version);
            println!("  palette_entries = [{}]", palette.defined);
        }
        SegmentBody::ObjectDefinition(ods) => {
            println!("  object_id = {}", ods.id);
            println!("  object_version = {}", ods.version);
            println!("  object_sequence = {:?}", ods.sequence);
            if ods.sequence.is_first() {
                println!("  object_length = {}", ods.length);
                println!("  object_width = {}", ods.width);
                println!("  object_height = {}", ods.height);
            }
            println!("  object_data = [{}]", ods.data.len());
        }
        SegmentBody::End => (),
    }
}

fn print_display_sets(presentation: &Presentation, fallback_ms: u32) {

    for (index, display_set) in presentation.display_sets.iter().enumerate() {

        let end = presentation.end_timestamp(index, fallback_ms)
            .unwrap_or(display_set.pts);

        println!(
            "display_set {} ({} --> {})",
            index,
            format_timestamp(display_set.pts),
            format_timestamp(end),
        );
        print_display_set(display_set);
        println!();
    }
}

fn print_display_set(display_set: &DisplaySet) {

    if let Some(state) = display_set.composition_state() {
        println!("  composition_state = {:?}", state);
    }
    println!("  epoch_start = {}", display_set.is_epoch_start());
    println!("  epoch_end = {}", display_set.is_epoch_end());
    if let Some(windows) = &display_set.windows {
        println!("  windows = [{}]", windows.len());
    }
    if let Some(palette) = &display_set.palette {
        println!("  palette = {} (version {})", palette.id, palette.version);
    }
    for object in display_set.objects.iter() {
        println!(
            "  object {} ({}x{}, {} of {} bytes)",
            object.id,
            object.width,
            object.height,
            object.accumulated,
            object.length,
        );
    }
    for object in display_set.active_objects() {
        println!("  active_object = {}", object.id);
    }
    match display_set.end {
        Some(end) => println!("  end = {}", format_timestamp(end)),
        None => println!("  end = missing"),
    }
}

fn print_findings(findings: &[Finding]) {
    for finding in findings.iter() {
        println!("finding ({}): {}", format_timestamp(finding.pts), finding.issue);
    }
}
