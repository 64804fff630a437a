use clap::{Parser, Subcommand};
use log::{debug, error};
use pkey_rust::pkey_common_rs::key::core::format_base::key_layout;
use pkey_rust::pkey_common_rs::key::core::bit_utils::BitField;
use pkey_rust::pkey_common_rs::key::types::{ChecksumSpec, KeyCodec, KeyFields};
use pkey_rust::pkey_common_rs::utils::batch::{BatchMode, KeyBatchGenerator};
use pkey_rust::pkey_common_rs::utils::config_loader::{ConfigLoader, PKeyConfig};
use pkey_rust::pkey_common_rs::utils::key_syntax::precheck;
use pkey_rust::pkey_common_rs::utils::log_config::init_logging;
use pkey_rust::pkey_common_rs::utils::numeric::{parse_field_value, parse_hex_or_dec};
use pkey_rust::pkey_common_rs::utils::output::{format_decoded, OutputFormat};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "keycutter")]
#[command(about = "5x5 プロダクトキーのエンコード・デコードツール")]
#[command(version = "0.1.0")]
#[command(long_about = "
5x5 プロダクトキー (XXXXX-XXXXX-XXXXX-XXXXX-XXXXX) の生成と解析を行います。

- encode: グループ・シリアル・セキュリティ値からキーを生成
- decode: キーを各フィールドに分解
- verify: キーのチェックサムを検証
- batch:  1つのグループに対してキーをまとめて生成
- config: 有効な設定の表示・保存

数値引数は 10進 または 0x 付きの16進で指定できます。
")]
struct Cli {
    /// デバッグモード
    #[arg(short, long, global = true)]
    debug: bool,

    /// 設定ファイル (.toml / .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// フィールド値からキーを生成
    #[command(alias = "e")]
    Encode {
        /// グループID (20bit)
        group: String,
        /// シリアル (30bit)
        serial: String,
        /// セキュリティ値 (53bit)
        security: String,
        /// Upgrade ビット (0/1)
        #[arg(short)]
        u: Option<String>,
        /// チェックサム (0x400 で自動計算)
        #[arg(short)]
        c: Option<String>,
        /// Extra ビット (0/1)
        #[arg(short)]
        e: Option<String>,
    },
    /// キーをフィールドに分解
    #[command(alias = "d")]
    Decode {
        /// 5x5 キー
        key: String,
        /// 出力形式 (parametric, raw, rawhex, json)
        #[arg(short, long)]
        output: Option<OutputFormat>,
        /// チェックサム不一致をエラーにする
        #[arg(long)]
        verify: bool,
    },
    /// キーのチェックサムを検証
    Verify {
        /// 5x5 キー
        key: String,
    },
    /// キーをまとめて生成
    #[command(alias = "b")]
    Batch {
        /// グループID
        group: String,
        /// 生成件数 (1〜500)
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
        /// 連番の開始シリアル
        #[arg(long, default_value = "0")]
        serial: String,
        /// 連番時のセキュリティ値
        #[arg(long, default_value = "0")]
        security: String,
        /// シリアルとセキュリティを乱数で決める
        #[arg(long)]
        random: bool,
        /// 乱数シード
        #[arg(long)]
        seed: Option<u64>,
    },
    /// 設定情報表示
    Config {
        /// 設定をファイルに保存
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PKeyConfig, Box<dyn Error>> {
    let loader = match path {
        Some(p) => ConfigLoader::with_paths(vec![p.clone()]),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

fn parse_flag(field: &BitField, input: Option<&str>, default: u8) -> Result<u8, Box<dyn Error>> {
    match input {
        Some(s) => Ok(parse_field_value(field, s)?),
        None => Ok(default),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli.config.as_ref())?;
    let level = if cli.debug { "debug" } else { config.logging.level.as_str() };
    // ロガーは一度だけ初期化できる。失敗しても処理は続ける
    if let Err(e) = init_logging(level, config.logging.timestamps) {
        eprintln!("⚠️ {}", e);
    }
    debug!("有効な設定: {:?}", config);

    let layout = key_layout();

    match cli.command {
        Commands::Encode { group, serial, security, u, c, e } => {
            let fields = KeyFields::new(
                parse_field_value(&layout.group, &group)?,
                parse_field_value(&layout.serial, &serial)?,
                parse_field_value(&layout.security, &security)?,
                0,
                parse_flag(&layout.upgrade, u.as_deref(), config.encode.upgrade)?,
                parse_flag(&layout.extra, e.as_deref(), config.encode.extra)?,
            );
            let checksum = match c {
                Some(s) => ChecksumSpec::from_raw(parse_hex_or_dec(&s)?)?,
                None => config.encode.checksum_spec()?,
            };

            let key = KeyCodec::encode_fields(&fields, checksum)?;
            println!("{}", key.key5x5);
        }
        Commands::Decode { key, output, verify } => {
            if !precheck(&key) {
                return Err("Invalid product key".into());
            }
            let decoded = if verify || config.decode.verify_checksum {
                KeyCodec::decode_verified(key.trim())?
            } else {
                KeyCodec::decode(key.trim())?
            };
            println!("{}", format_decoded(&decoded, output.unwrap_or(config.decode.output)));
        }
        Commands::Verify { key } => {
            let decoded = KeyCodec::decode(key.trim())?;
            match decoded.verify_checksum() {
                Ok(()) => println!("✅ チェックサム一致: {} (0x{:03x})", decoded.key5x5, decoded.fields.checksum),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Batch { group, count, serial, security, random, seed } => {
            let group: u32 = parse_field_value(&layout.group, &group)?;
            let mode = if random || config.batch.random {
                BatchMode::Random
            } else {
                BatchMode::Sequential {
                    base_serial: parse_field_value(&layout.serial, &serial)?,
                    security: parse_field_value(&layout.security, &security)?,
                }
            };

            let mut generator = KeyBatchGenerator::new(group, mode)
                .with_flags(config.encode.upgrade, config.encode.extra)
                .with_max_count(config.batch.max_count);
            if let Some(seed) = seed.or(config.batch.seed) {
                generator = generator.with_seed(seed);
            }

            for entry in generator.generate(count)? {
                println!("{}", entry.display_line());
            }
        }
        Commands::Config { save } => {
            if let Some(path) = save {
                ConfigLoader::new().save_config(&config, &path)?;
                println!("💾 設定を保存しました: {}", path.display());
            } else {
                println!("keycutter 設定情報:");
                println!("  encode.upgrade         = {}", config.encode.upgrade);
                println!("  encode.extra           = {}", config.encode.extra);
                println!("  encode.checksum        = {}", config.encode.checksum);
                println!("  decode.output          = {}", config.decode.output);
                println!("  decode.verify_checksum = {}", config.decode.verify_checksum);
                println!("  batch.max_count        = {}", config.batch.max_count);
                println!("  batch.random           = {}", config.batch.random);
                println!("  logging.level          = {}", config.logging.level);
            }
        }
    }

    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}
