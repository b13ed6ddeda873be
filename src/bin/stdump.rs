//! Subtarget dump tool.
//!
//! Resolves a subtarget from command-line configuration strings and prints
//! the result, including the derived register masks and timing data. Handy
//! for checking what a CPU/feature-string combination actually selects:
//!
//! ```text
//! stdump varc64el-unknown-linux-gnuabi64 --cpu v2-generic --features +vfpu
//! ```

use clap::Parser;

use varc::{
    CodegenOptions, ItinClass, OptLevel, ReducedOverride, RelocModel, TargetMachine,
};

fn parse_reloc(s: &str) -> Result<RelocModel, String> {
    match s {
        "static" => Ok(RelocModel::Static),
        "pic" => Ok(RelocModel::Pic),
        "dynamic-no-pic" => Ok(RelocModel::DynamicNoPic),
        _ => Err(format!(
            "unknown relocation model '{s}' (expected static, pic or dynamic-no-pic)"
        )),
    }
}

fn parse_opt_level(s: &str) -> Result<OptLevel, String> {
    match s {
        "none" => Ok(OptLevel::None),
        "default" => Ok(OptLevel::Default),
        "aggressive" => Ok(OptLevel::Aggressive),
        _ => Err(format!(
            "unknown optimization level '{s}' (expected none, default or aggressive)"
        )),
    }
}

fn parse_force_reduced(s: &str) -> Result<ReducedOverride, String> {
    match s {
        "on" => Ok(ReducedOverride::ForceOn),
        "off" => Ok(ReducedOverride::ForceOff),
        _ => Err(format!("expected 'on' or 'off', got '{s}'")),
    }
}

#[derive(Parser)]
#[command(name = "stdump", about = "Resolve and print a VARC subtarget configuration")]
struct Args {
    /// Target triple, e.g. varc64el-unknown-linux-gnuabi64.
    triple: String,

    /// CPU name; empty selects the family baseline.
    #[arg(long, default_value = "")]
    cpu: String,

    /// Comma-separated feature tokens, e.g. "+v2,-dsp,+n32".
    #[arg(long, default_value = "")]
    features: String,

    #[arg(long, default_value = "static", value_parser = parse_reloc)]
    reloc: RelocModel,

    #[arg(long, default_value = "default", value_parser = parse_opt_level)]
    opt: OptLevel,

    /// Optimize for size (functions without float default to reduced mode).
    #[arg(long)]
    space_optimized: bool,

    /// Permit reduced and standard functions in the same module.
    #[arg(long)]
    allow_mixed: bool,

    /// Force the reduced encoding on or off for every query.
    #[arg(long, value_name = "on|off", value_parser = parse_force_reduced)]
    force_reduced: Option<ReducedOverride>,
}

const CLASS_NAMES: [(&str, ItinClass); 18] = [
    ("alu", ItinClass::Alu),
    ("load", ItinClass::Load),
    ("store", ItinClass::Store),
    ("branch", ItinClass::Branch),
    ("mul", ItinClass::Mul),
    ("div", ItinClass::Div),
    ("fp-add", ItinClass::FpAdd),
    ("fp-mul-s", ItinClass::FpMulS),
    ("fp-mul-d", ItinClass::FpMulD),
    ("fp-div-s", ItinClass::FpDivS),
    ("fp-div-d", ItinClass::FpDivD),
    ("fp-cvt", ItinClass::FpCvt),
    ("fp-move", ItinClass::FpMove),
    ("fp-load", ItinClass::FpLoad),
    ("fp-store", ItinClass::FpStore),
    ("dsp-alu", ItinClass::DspAlu),
    ("dsp-mul", ItinClass::DspMul),
    ("pseudo", ItinClass::Pseudo),
];

fn main() {
    env_logger::init();
    let args = Args::parse();

    let options = CodegenOptions {
        opt_level: args.opt,
        space_optimized: args.space_optimized,
        allow_mixed_modes: args.allow_mixed,
        reduced_override: args.force_reduced.unwrap_or_default(),
    };
    let machine = TargetMachine::new(&args.triple, &args.cpu, &args.features, args.reloc, options);
    let st = machine.subtarget();
    let config = st.config();

    println!("triple:          {}", st.triple());
    println!("cpu:             {}", st.cpu());
    println!("arch:            {}", config.arch_version);
    println!("abi:             {}", config.abi);
    println!("endian:          {}", config.endian);
    println!("reloc:           {}", config.reloc_model);
    println!("gp64:            {}", config.gp64);
    println!("fp64:            {}", config.fp64);
    println!("single-float:    {}", config.single_float);
    println!("vfpu:            {}", config.has_vfpu);
    println!("dsp:             {}", config.has_dsp);
    println!("dspr2:           {}", config.has_dspr2);
    println!("seinreg:         {}", config.has_sext_in_reg);
    println!("condmov:         {}", config.has_cond_mov);
    println!("swap:            {}", config.has_swap);
    println!("bitcount:        {}", config.has_bit_count);
    println!("fpidx:           {}", config.has_fp_idx);
    println!("reduced mode:    {}", st.in_reduced_mode());
    println!("micro mode:      {}", st.in_micro_mode());
    println!("mixed modes:     {}", st.allows_mixed_modes());
    println!("small section:   {}", st.use_small_section());
    println!("linux:           {}", st.is_linux());
    println!("sandboxed:       {}", st.is_sandboxed());

    let info = st.reg_info();
    println!();
    println!("gpr mask:        {:#010x}", info.gpr_mask);
    for (bank, mask) in info.cpr_mask.iter().enumerate() {
        println!("cpr{bank} mask:       {mask:#010x}");
    }
    println!("gp value:        {:#x}", info.gp_value);

    let policy = st.post_ra_scheduling();
    println!();
    println!(
        "post-ra sched:   enabled={} anti-dep={:?} critical-path={:?}",
        policy.enabled, policy.anti_dep, policy.critical_path
    );

    let itineraries = st.instr_itineraries();
    println!();
    println!(
        "itinerary:       {} (issue width {})",
        itineraries.cpu(),
        itineraries.issue_width()
    );
    for (name, class) in CLASS_NAMES {
        let latency = itineraries.latency(class);
        if latency > 0 {
            println!("  {name:<10} {latency:>3} cycles");
        }
    }
}
