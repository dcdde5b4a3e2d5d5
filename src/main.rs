use clap::Parser;
use dialoguer::Input;
use furniture_detect::api::ApiClient;
use furniture_detect::media::{CaptureSource, MediaAcquirer, PathPicker};
use furniture_detect::share::{GenerateOutcome, ReportSource, ShareCardGenerator};
use furniture_detect::uploader::{HttpUploader, UploadMetadata};
use furniture_detect::workflow::{AnalysisOutcome, AnalysisWorkflow, WorkflowState};
use furniture_detect::{cli, config, error};
use cli::{Cli, Commands};
use config::Config;
use error::{DetectError, Result};
use furniture_detect_common::{CardTemplate, DetectionResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const DISCLAIMER: &str = "本工具提供的材质识别与健康风险评估仅供参考，不构成专业检测或医疗意见。\n如有身体不适或健康问题，请及时咨询专业机构。";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // すべての失敗は分類してから表示する
    if let Err(err) = run(cli).await {
        exit_with(&err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Detect { image, source, accept_disclaimer, output, share, template } => {
            println!("🪑 furniture-detect - 家具检测\n");

            let accepted = accept_disclaimer || confirm_disclaimer()?;
            let result = run_detect(&config, &image, source, accepted).await?;

            let json = serde_json::to_string_pretty(&result)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ 结果已保存: {}", path.display());
                }
                None => println!("{}", json),
            }

            if share {
                run_share(&config, ReportSource::Report(result), template).await?;
            }
        }

        Commands::Share { report_id, input, template } => {
            println!("🖼  furniture-detect - 生成分享卡片\n");

            let source = match (report_id, input) {
                (Some(id), _) => ReportSource::ReportId(id),
                (None, Some(path)) => ReportSource::Report(load_result(&path)?),
                (None, None) => return Err(DetectError::Config("缺少报告数据".into())),
            };
            run_share(&config, source, template).await?;
        }

        Commands::Health => {
            let client = ApiClient::from_config(&config)?;
            let health = client.health_check().await?;
            let mark = if health.is_healthy() { "✔" } else { "⚠" };
            println!("{} {} ({})", mark, health.status, config.base_url);
            for (service, status) in &health.services {
                println!("  {}: {}", service, status);
            }
        }

        Commands::Config { set_base_url, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ 已设置服务地址");
            }

            if show {
                println!("设置:");
                println!("  服务地址: {}", config.base_url);
                println!("  超时: {}ms", config.timeout_ms);
                println!("  图片大小上限: {}MB", config.max_image_size_mb);
                println!("  配置文件: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn confirm_disclaimer() -> Result<bool> {
    println!("免责声明:\n{}\n", DISCLAIMER);
    let input: String = Input::new()
        .with_prompt("是否已阅读并同意免责声明？(Y/n)")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| DetectError::Prompt(e.to_string()))?;

    Ok(is_consent(&input))
}

/// 空入力は同意扱い
fn is_consent(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "" | "y" | "yes" | "是")
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn state_message(state: &WorkflowState) -> &'static str {
    match state {
        WorkflowState::Acquiring => "获取图片中...",
        WorkflowState::Uploading { .. } => "识别中...",
        _ => "处理中...",
    }
}

async fn run_detect(
    config: &Config,
    image: &Path,
    source: CaptureSource,
    disclaimer_accepted: bool,
) -> Result<DetectionResult> {
    let acquirer = MediaAcquirer::new(PathPicker::new(image));
    let uploader = HttpUploader::from_config(config)?;
    let workflow = AnalysisWorkflow::new(acquirer, uploader, UploadMetadata::with_disclaimer(disclaimer_accepted));

    let bar = spinner("获取图片中...");
    let mut states = workflow.subscribe();
    let outcome = {
        let run = workflow.start(source);
        tokio::pin!(run);
        loop {
            tokio::select! {
                outcome = &mut run => break outcome,
                Ok(()) = states.changed() => {
                    bar.set_message(state_message(&states.borrow_and_update()));
                }
            }
        }
    };
    bar.finish_and_clear();

    match outcome {
        AnalysisOutcome::Completed(Ok(result)) => {
            println!("✔ 识别完成: {}", result.furniture_type);
            Ok(result)
        }
        AnalysisOutcome::Completed(Err(error)) => {
            eprintln!("❌ 识别失败: {}", error.message);
            std::process::exit(1);
        }
        AnalysisOutcome::Busy | AnalysisOutcome::Superseded => {
            Err(DetectError::Config("识别已被其他请求取代".into()))
        }
    }
}

async fn run_share(config: &Config, source: ReportSource, template: CardTemplate) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let generator = ShareCardGenerator::new(client, source);

    let bar = spinner("生成中...");
    let outcome = generator.generate(template).await;
    bar.finish_and_clear();

    match outcome {
        GenerateOutcome::Completed(Ok(card_url)) => {
            println!("✔ 分享卡片 ({}): {}", template, card_url);
            Ok(())
        }
        GenerateOutcome::Completed(Err(error)) => {
            eprintln!("❌ 生成失败: {}", error.message);
            std::process::exit(1);
        }
        GenerateOutcome::Busy => Ok(()),
    }
}

fn load_result(path: &Path) -> Result<DetectionResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn exit_with(err: &DetectError) -> ! {
    let classified = furniture_detect::classify(err);
    eprintln!("❌ {}", classified.message);
    std::process::exit(1);
}
