use std::io::Write;

use epg::psi::{PsiError, PsiSection};
use epg::schedule::MemoryStore;
use epg::{Collector, Options};

const HELP: &str = "\
EITのセクションから番組表を組み立てて表示するコマンド

USAGE:
  epg [OPTIONS] [PATH]

FLAGS:
  -h, --help         このヘルプを表示する
  -s, --stats        ジャンルや記述子の使用状況を標準エラー出力に表示する

OPTIONS:
  -c, --config PATH  設定ファイル（TOML）のパス

ARGS:
  <PATH>     CRC付きのセクションを連結したファイルのパス
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let show_stats = args.contains(["-s", "--stats"]);
    let config: Option<std::path::PathBuf> = args.opt_value_from_str(["-c", "--config"])?;
    let path: std::path::PathBuf = args.free_from_str()?;

    env_logger::init();

    let options = match config {
        Some(config) => Options::load(config)?,
        None => Options {
            create_missing_channels: true,
            ..Options::default()
        },
    };
    let data = std::fs::read(path)?;

    let mut collector = Collector::new(options);
    let mut store = MemoryStore::new();

    let mut buf = &*data;
    while !buf.is_empty() {
        let (psi, len) = match PsiSection::parse(buf) {
            Ok(v) => v,
            Err(PsiError::EndOfPsi | PsiError::InsufficientLength) => break,
            Err(e @ (PsiError::Corrupted(len) | PsiError::Crc32(len))) => {
                log::warn!("{} EIT error: skipping {} bytes", e, len);
                buf = &buf[len..];
                continue;
            }
        };
        buf = &buf[len..];

        match collector.process_psi(&psi, &mut store) {
            Ok(report) => log::debug!("{:?}", report),
            Err(e) => log::warn!("{} EIT error: table 0x{:02X}", e, psi.table_id),
        }
    }

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for entry in store.entries() {
        writeln!(stdout, "{}", serde_json::to_string(entry)?)?;
    }

    if show_stats {
        for category in collector.categories().iter().filter(|c| c.usage != 0) {
            eprintln!(
                "{:X}/{:X} {}: {} ({})",
                category.content_type,
                category.subtype,
                category.label,
                category.usage,
                category.sample_title.as_deref().unwrap_or_default(),
            );
        }

        let stats = collector.stats();
        let mut tags: Vec<_> = stats.descriptor_tags.iter().collect();
        tags.sort_unstable();
        for (tag, count) in tags {
            eprintln!("descriptor 0x{:02X}: {}", tag, count);
        }
        eprintln!(
            "unknown descriptors: {}, failed descriptors: {}",
            stats.unknown_descriptors, stats.failed_descriptors,
        );
        for (lang_code, count) in &stats.languages {
            eprintln!("language {}: {}", lang_code, count);
        }
    }

    Ok(())
}
