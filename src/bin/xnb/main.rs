//! XNB CLI - Tool for inspecting XNB content files.

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process;

use xnb::xnb::codec::XnbRead;
use xnb::xnb::manifest::read_manifest;
use xnb::{ContentManager, ContentValue, XnbHeader};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_help();
        return;
    }

    let result = match args[1].as_str() {
        "info" | "i" => args
            .get(2)
            .ok_or_else(|| usage("info <file.xnb>"))
            .and_then(|f| info(f).map_err(|e| e.to_string())),
        "dump" | "d" => args
            .get(2)
            .ok_or_else(|| usage("dump <file.xnb>"))
            .and_then(|f| dump(f).map_err(|e| e.to_string())),
        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        cmd => Err(format!("Unknown command: {cmd}")),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn usage(msg: &str) -> String {
    format!("missing argument\nUsage: xnb-cli {msg}")
}

/// Print the container header and the reader manifest without decoding the
/// payload.
fn info(file: &str) -> xnb::Result<()> {
    let mut stream = BufReader::new(File::open(file)?);
    let header = XnbHeader::parse(&mut stream)?;

    println!("File:      {file}");
    println!("Platform:  {:?}", header.platform);
    println!("Version:   {}", header.version);
    println!("Profile:   {}", if header.hidef { "HiDef" } else { "Reach" });
    println!("Size:      {} bytes", header.file_size);
    if header.compressed {
        println!("Payload:   compressed (manifest unavailable)");
        return Ok(());
    }

    let entries = read_manifest(&mut stream)?;
    let shared = stream.read_7bit_encoded_int()?;
    println!("Shared resource slots: {shared}");
    println!("Type readers ({}):", entries.len());
    for (i, entry) in entries.iter().enumerate() {
        println!("  [{}] {} (v{})", i + 1, entry.name, entry.version);
    }
    Ok(())
}

/// Fully decode the primary object and print its debug form. The file's
/// directory becomes the content root, so external references resolve.
fn dump(file: &str) -> xnb::Result<()> {
    let path = Path::new(file);
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let asset_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| xnb::Error::other(format!("not an .xnb path: {file}")))?;

    let manager = ContentManager::new(root);
    let value: ContentValue = manager.load(asset_name)?;
    println!("{value:#?}");
    Ok(())
}

fn print_help() {
    println!("xnb-cli - XNB content file inspector");
    println!();
    println!("Usage:");
    println!("  xnb-cli info <file.xnb>   Show container header and type reader manifest");
    println!("  xnb-cli dump <file.xnb>   Decode the primary object and print it");
    println!();
    println!("Set RUST_LOG=xnb=trace for decoder tracing.");
}
