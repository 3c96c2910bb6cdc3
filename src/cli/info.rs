use anyhow::Result;
use cdp_adapter::detect_chrome_executable;

use super::context::CliContext;

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();

    println!("webprobe System Information");
    println!("===========================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("WEBPROBE_BUILD_DATE"));
    println!("Git Commit: {}", env!("WEBPROBE_GIT_HASH"));
    println!();

    println!("Configuration ({}):", ctx.config_path().display());
    println!("- Oracle: {}{}", config.oracle.base_url, config.oracle.api_prefix);
    println!(
        "- Oracle API key: {}",
        if config.oracle.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("- Oracle timeout: {}ms", config.oracle.timeout_ms);
    let policy = config.outbound_policy();
    println!("- Outbound allow-list: {}", policy.patterns().join(", "));
    println!("- Settle delay: {}ms", config.explorer.settle_delay_ms);
    println!(
        "- Same-page limit: {} iterations",
        config.explorer.max_same_page_iterations
    );
    match config.explorer.max_transient_retries {
        Some(max) => println!("- Transient retries: up to {}", max),
        None => println!("- Transient retries: unbounded"),
    }
    println!("- Page validation: {}", on_off(config.explorer.validate_pages));
    println!("- Output Directory: {}", config.output_dir.display());
    if ctx.metrics_port() > 0 {
        println!("- Metrics port: {}", ctx.metrics_port());
    }
    println!();

    println!("Browser:");
    println!("- Headless: {}", config.browser.headless);
    match detect_chrome_executable() {
        Some(path) => println!("- Chromium: {} ✓", path.display()),
        None => println!("- Chromium: not found (set WEBPROBE_CHROME)"),
    }

    match config.validate() {
        Ok(()) => println!("\nConfiguration: ✓ valid"),
        Err(err) => println!("\nConfiguration: ✗ {}", err),
    }
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "enabled"
    } else {
        "disabled"
    }
}
