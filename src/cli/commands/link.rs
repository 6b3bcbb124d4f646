//! Single-track linking command.

use tokio::runtime::Runtime;

use crate::config::Config;
use crate::linking::{MatchSummary, Source, Sourced, UnifiedOutputRecord};

use super::{MatchArgs, TrackArgs, build_engine};

/// Link one track and print the unified record
pub fn cmd_link(
    rt: &Runtime,
    config: &Config,
    track: &TrackArgs,
    matching: &MatchArgs,
    json: bool,
) -> anyhow::Result<()> {
    let input = track.input_record(matching.strict(config));
    let match_config = matching.match_config(config);
    let engine = build_engine(config)?;

    let record = rt.block_on(engine.link(&input, &match_config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &UnifiedOutputRecord) {
    if record.is_linked() {
        println!("✓ Linked with {} provider(s)", record.links.len());
    } else {
        println!("✗ No provider produced a match");
    }
    println!();

    print_field("Title", &record.title);
    print_field("Artist", &record.artist);
    print_field("Album", &record.album);
    print_field("Track", &record.track_number);
    print_field("Year", &record.release_year);
    if let Some(duration) = &record.duration {
        println!("  {:<8} {:.1}s{}", "Length:", duration.value, origin(duration.source));
    }
    print_field("MBID", &record.canonical_id);
    print_field("ISRC", &record.recording_code);
    if let Some(bpm) = &record.bpm {
        println!("  {:<8} {:.0}{}", "BPM:", bpm.value, origin(bpm.source));
    }
    if record.recording_codes.len() > 1 {
        println!("  {:<8} {}", "All ISRCs:", record.recording_codes.join(", "));
    }

    println!();
    for (provider, summary) in &record.matches {
        match summary {
            MatchSummary::Matched { score, .. } => {
                let link = record.links.get(provider);
                let url = link.and_then(|l| l.url.as_deref()).unwrap_or("");
                println!("  ✓ {:<15} {:>3.0}%  {}", provider.to_string(), score * 100.0, url);
            }
            MatchSummary::NoMatch(reason) => {
                println!("  ✗ {:<15} {}", provider.to_string(), reason);
            }
        }
    }
}

fn print_field<T: std::fmt::Display>(label: &str, field: &Option<Sourced<T>>) {
    if let Some(field) = field {
        println!("  {:<8} {}{}", format!("{label}:"), field.value, origin(field.source));
    }
}

fn origin(source: Source) -> String {
    match source {
        Source::Input => " (input)".to_string(),
        Source::Provider(provider) => format!(" ({provider})"),
    }
}
