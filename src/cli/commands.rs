use crate::gateway::gateway::{FallbackGateway, Gateway, GatewayConfig};
use crate::gateway::host::serve;
use crate::page::fixture::PageFixture;
use crate::page::simulation::{SimulationOptions, SimulationReport, simulate};
use crate::trace::logger::TraceLogger;

/// Prompt used by `test` to check the configured gateway end to end.
pub const SAMPLE_PROMPT: &str = "Write a summary of a technical article";

// ============================================================================
// enhance / test subcommands
// ============================================================================

pub fn cmd_enhance(text: &str, config: &GatewayConfig, verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = FallbackGateway::from_config(config);
    if verbose > 0 {
        eprintln!("Strategies: {}", gateway.strategy_names().join(" -> "));
    }
    let enhanced = gateway.enhance(text)?;
    println!("{}", enhanced);
    Ok(())
}

pub fn cmd_test(config: &GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = FallbackGateway::from_config(config);
    println!("=== Enhancement Test ===");
    println!("Strategies: {}", gateway.strategy_names().join(" -> "));
    println!("Original: {}", SAMPLE_PROMPT);
    match gateway.enhance(SAMPLE_PROMPT) {
        Ok(enhanced) => {
            println!("Enhanced: {}", enhanced);
            println!("Test successful!");
            Ok(())
        }
        Err(e) => {
            println!("Enhancement failed: {}", e);
            Err(e.into())
        }
    }
}

// ============================================================================
// serve subcommand
// ============================================================================

pub fn cmd_serve(config: &GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = FallbackGateway::from_config(config);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stats = serve(&gateway, stdin.lock(), stdout.lock())?;
    eprintln!(
        "Handled {} messages ({} ignored, {} rejected)",
        stats.handled, stats.ignored, stats.rejected
    );
    Ok(())
}

// ============================================================================
// simulate subcommand
// ============================================================================

pub fn cmd_simulate(
    page: &str,
    options: SimulationOptions,
    config: &GatewayConfig,
    trace_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PageFixture::load(page)?;
    let gateway = Box::new(FallbackGateway::from_config(config));
    let report = simulate(&fixture, gateway, options, TraceLogger::optional(trace_path))?;
    print!("{}", format_report(&report));
    Ok(())
}

pub fn format_report(report: &SimulationReport) -> String {
    let mut out = String::new();
    let title = if report.title.is_empty() { "(untitled)" } else { &report.title };
    out.push_str(&format!("=== Simulated page: {} ===\n", title));
    out.push_str(&format!(
        "Controls: {} at load, {} after insertion\n",
        report.initial_controls, report.inserted_controls
    ));

    for control in &report.controls {
        let name = control
            .name
            .clone()
            .unwrap_or_else(|| format!("node {}", control.node));
        out.push_str(&format!(
            "  - {} [{:?}, {:?}] {:?}\n",
            name, control.mode, control.accessor, control.state
        ));
        if let Some((left, top)) = &control.overlay {
            out.push_str(&format!("      overlay at left={} top={}\n", left, top));
        }
        if control.before != control.after {
            out.push_str(&format!("      before: {:?}\n", control.before));
            out.push_str(&format!("      after:  {:?}\n", control.after));
        }
    }

    for alert in &report.alerts {
        out.push_str(&format!("  ! {}\n", alert));
    }
    out
}
