use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use link_preview::{PreviewService, RequestSpec};
use std::error::Error;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("preview_cli")
        .about("Print link preview cards for one or more URLs")
        .arg(Arg::new("urls").required(true).num_args(1..))
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(clap::value_parser!(u64))
                .default_value("10")
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print records as JSON"),
        )
        .get_matches();

    let urls: Vec<String> = matches
        .get_many::<String>("urls")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let timeout = Duration::from_secs(*matches.get_one::<u64>("timeout").unwrap_or(&10));
    let as_json = matches.get_flag("json");

    let service = PreviewService::new();

    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut records = Vec::new();
    for url in &urls {
        let record = service
            .generate_preview_with_spec(RequestSpec::new(url.as_str()).with_timeout(timeout))
            .await;
        pb.inc(1);
        records.push(record);
    }
    pb.finish_and_clear();

    for record in records {
        if as_json {
            println!("{}", serde_json::to_string_pretty(&record)?);
            continue;
        }

        println!("\n{}", "Link Preview".bold().blue());
        println!("{}", "---------------".blue());
        println!("{}: {}", "URL".bold(), record.url);

        if record.load_failed {
            println!("{}", "load failed".red());
            continue;
        }

        println!("{}: {}", "Host".bold(), record.host.as_deref().unwrap_or("-"));
        println!("{}: {}", "Title".bold(), record.title);
        if !record.description.is_empty() {
            println!("{}: {}", "Description".bold(), record.description);
        }
        println!(
            "{}: {} ({})",
            "Type".bold(),
            record.media_type,
            record.content_type
        );
        if !record.keywords.is_empty() {
            println!("{}: {}", "Keywords".bold(), record.keywords.join(", "));
        }
        for image in record.images.unwrap_or_default() {
            println!("{}: {}", "Image".bold(), image.green());
        }
        for video in record.videos.unwrap_or_default() {
            println!(
                "{}: {} [{}]",
                "Video".bold(),
                video.url.green(),
                video.mime_type.as_deref().unwrap_or("unknown")
            );
        }
        for audio in record.audios.unwrap_or_default() {
            println!("{}: {}", "Audio".bold(), audio.green());
        }
    }

    Ok(())
}
