//! # Coilwork CLI
//!
//! Runs the torsional spring analysis on a JSON design file and prints the
//! report. Without a file it analyses a built-in two-stage demo damper.
//!
//! ```text
//! spring_cli design.json
//! spring_cli design.json --json > analysis.json
//! spring_cli --samples 400 --material SH-72=1750 -v
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spring_core::calculations::torsional::{
    analyze, AngleSource, AuditStatus, SafetyAssessment, SpringGroup, SystemDesign, TorsionalAnalysis,
};
use spring_core::{CalcError, CalcResult, ReportStatus, SpringMaterialDb, TorsionalPolicy};

/// Torsional spring system analysis
#[derive(Parser, Debug)]
#[command(name = "spring_cli")]
#[command(about = "Analyse a multi-stage torsional spring damper", long_about = None)]
#[command(version)]
struct Args {
    /// Design JSON file (built-in demo when omitted)
    #[arg(name = "DESIGN")]
    design: Option<PathBuf>,

    /// Print the full analysis as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Number of curve samples
    #[arg(long)]
    samples: Option<usize>,

    /// Rigid stop stiffness as a multiple of total nominal stiffness
    #[arg(long)]
    rigid_multiplier: Option<f64>,

    /// Extra angular clearance between neighbouring springs (deg)
    #[arg(long)]
    clearance_angle: Option<f64>,

    /// Sweep past max(system stop, reference angle) by this factor
    #[arg(long)]
    sweep_margin: Option<f64>,

    /// Lowest preferred spring index C = Dm/d
    #[arg(long)]
    index_min: Option<f64>,

    /// Highest preferred spring index C = Dm/d
    #[arg(long)]
    index_max: Option<f64>,

    /// Custom wire material as ID=TENSILE_MPA (repeatable)
    #[arg(long = "material", value_parser = parse_material)]
    materials: Vec<(String, f64)>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_material(s: &str) -> Result<(String, f64), String> {
    let (id, sut) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=TENSILE_MPA, got '{}'", s))?;
    let sut: f64 = sut
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a tensile strength in MPa", sut))?;
    Ok((id.trim().to_string(), sut))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_design(path: &Path) -> CalcResult<SystemDesign> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

fn demo_group(id: &str, engage_angle_deg: f64, rate_n_per_mm: f64, radius_mm: f64) -> SpringGroup {
    SpringGroup {
        id: id.to_string(),
        enabled: true,
        stage: None,
        spring_count: 6,
        rate_n_per_mm,
        radius_mm,
        engage_angle_deg,
        wire_diameter_mm: 3.2,
        mean_diameter_mm: 17.0,
        free_length_mm: 58.0,
        solid_length_mm: 30.0,
        clearance_mm: 1.0,
        material: "chrome silicon".to_string(),
    }
}

fn demo_design() -> SystemDesign {
    SystemDesign::new(
        "Demo two-stage clutch damper",
        vec![
            demo_group("outer", 0.0, 12.0, 95.0),
            demo_group("inner", 8.0, 30.0, 70.0),
        ],
        12.0,
    )
    .with_friction(4.0)
    .with_operating_angle(11.0, AngleSource::Drawing)
}

fn build_policy(args: &Args) -> TorsionalPolicy {
    let mut policy = TorsionalPolicy::new();
    if let Some(samples) = args.samples {
        policy = policy.with_sample_count(samples);
    }
    if let Some(multiplier) = args.rigid_multiplier {
        policy = policy.with_rigid_stop_multiplier(multiplier);
    }
    if let Some(clearance) = args.clearance_angle {
        policy = policy.with_collision_clearance_deg(clearance);
    }
    if let Some(margin) = args.sweep_margin {
        policy = policy.with_sweep_margin(margin);
    }
    if args.index_min.is_some() || args.index_max.is_some() {
        let min = args.index_min.unwrap_or(policy.spring_index_min);
        let max = args.index_max.unwrap_or(policy.spring_index_max);
        policy = policy.with_spring_index_range(min, max);
    }
    policy
}

fn run(args: &Args) -> CalcResult<TorsionalAnalysis> {
    let design = match &args.design {
        Some(path) => {
            info!(path = %path.display(), "Loading design");
            load_design(path)?
        }
        None => {
            info!("No design file given, using the built-in demo");
            demo_design()
        }
    };
    let mut materials = SpringMaterialDb::standard();
    for (id, sut) in &args.materials {
        materials = materials.with_material(id, *sut);
    }
    analyze(&design, &build_policy(args), &materials)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(analysis) => {
            if args.json {
                match analysis.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_report(&analysis);
            }
            match analysis.status() {
                ReportStatus::Fail => ExitCode::from(2),
                _ => ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn print_report(analysis: &TorsionalAnalysis) {
    let system = &analysis.system;
    let reference = &analysis.reference;

    println!("═══════════════════════════════════════");
    println!("  TORSIONAL SPRING SYSTEM: {}", analysis.design_label);
    println!("═══════════════════════════════════════");
    println!();
    println!("Groups:");
    for g in &system.groups {
        println!(
            "  {:<10} n={:<2} R={:>6.1} mm  θ_start={:>6.2}°  θ_stop={:>6.2}°  Kθ={:>7.3} N·m/°",
            g.id(),
            g.group.spring_count,
            g.group.radius_mm,
            g.engage_angle_deg(),
            g.stop_angle_deg,
            g.angular_stiffness_nm_per_deg
        );
    }
    println!();
    println!("System:");
    println!("  Stop angle      = {:.2}°", system.system_stop_deg);
    println!("  Total stiffness = {:.3} N·m/°", system.total_nominal_stiffness_nm_per_deg);
    println!("  Friction        = {:.2} N·m", system.friction_torque_nm);
    println!("  Peak torque     = {:.1} N·m", analysis.curve.peak_torque_nm());
    println!("  Hysteresis      = {:.2} J/cycle", analysis.curve.hysteresis_energy_j());
    println!();
    println!("Reference angle {:.2}°:", reference.angle_deg);
    println!(
        "  T_loaded = {:.1} N·m   T_unloaded = {:.1} N·m   K = {:.3} N·m/°",
        reference.loaded_torque_nm, reference.unloaded_torque_nm, reference.stiffness_nm_per_deg
    );
    for r in &reference.groups {
        println!(
            "  {:<10} F={:>7.1} N  τ={:>6.0}/{:>5.0} MPa  util={:.2} {}",
            r.group_id,
            r.force_per_spring_n,
            r.shear_stress_mpa,
            r.allowable_stress_mpa,
            r.utilization,
            status_icon(r.passes())
        );
    }
    println!();

    if !analysis.transitions.transitions.is_empty() {
        println!("Transitions:");
        for t in &analysis.transitions.transitions {
            println!(
                "  {:>6.2}° [{}] {}: {}",
                t.angle_deg,
                t.severity,
                t.engaging_groups.join(", "),
                t.explanation
            );
        }
        println!();
    }

    match &analysis.report.safety {
        SafetyAssessment::CapabilityReference { safe_angle_deg } => {
            println!("Safety: capability reference, safe angle {:.2}°", safe_angle_deg);
        }
        SafetyAssessment::Checked {
            operating_angle_deg,
            safe_angle_deg,
            ratio,
            status,
            ..
        } => {
            println!(
                "Safety: {:.2}° / {:.2}° = {:.0}% {}",
                operating_angle_deg,
                safe_angle_deg,
                ratio * 100.0,
                status_icon(*status == AuditStatus::Pass)
            );
        }
    }
    println!();

    println!("Findings:");
    for f in &analysis.report.findings {
        println!("  {}", f);
    }
    println!();
    println!("═══════════════════════════════════════");
    println!("  RESULT: {}", analysis.report.status);
    println!("═══════════════════════════════════════");
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}
