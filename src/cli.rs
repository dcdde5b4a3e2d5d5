use crate::media::CaptureSource;
use clap::{Parser, Subcommand};
use furniture_detect_common::CardTemplate;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "furniture-detect")]
#[command(about = "家具材质检测客户端：拍照识别・生成分享卡片", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をアップロードして家具・材質を検出
    Detect {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 撮影元 (camera/gallery)
        #[arg(short, long, value_enum, default_value = "camera")]
        source: CaptureSource,

        /// 免責事項に同意済み（省略時は確認する）
        #[arg(long)]
        accept_disclaimer: bool,

        /// 結果JSONの出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 検出後に分享卡片も生成
        #[arg(long)]
        share: bool,

        /// 分享卡片テンプレート (modern/classic/minimal)
        #[arg(short, long, default_value = "modern")]
        template: CardTemplate,
    },

    /// 分享卡片を生成
    Share {
        /// 報告ID
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        report_id: Option<String>,

        /// 検出結果JSONファイル
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// テンプレート (modern/classic/minimal)
        #[arg(short, long, default_value = "modern")]
        template: CardTemplate,
    },

    /// サービスの稼働確認
    Health,

    /// 設定を表示/編集
    Config {
        /// サービスのベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
