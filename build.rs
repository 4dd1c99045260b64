use anyhow::Result;
use sdboot_config::{codegen::generate_modules, Configuration};
use std::{env, fs, path::PathBuf};

const DEFAULT_CONFIGURATION: &str = "sdboot_config/sample_configurations/fmu_v2.ron";

fn main() -> Result<()> { process_configuration_file() }

/// Board files come from the `SDBOOT_CONFIG` environment variable (RON text)
/// or, when it is absent or empty, from the sample FMUv2 configuration.
fn process_configuration_file() -> Result<()> {
    println!("cargo:rerun-if-env-changed=SDBOOT_CONFIG");
    println!("cargo:rerun-if-changed={}", DEFAULT_CONFIGURATION);

    let supplied = env::var("SDBOOT_CONFIG").ok().filter(|config| !config.is_empty());
    let configuration = match &supplied {
        Some(config) => Configuration::from_ron(config)?,
        None => Configuration::from_ron(&fs::read_to_string(DEFAULT_CONFIGURATION)?)?,
    };

    // Host builds (unit tests) run without any port feature enabled.
    let targets_arm = env::var("CARGO_CFG_TARGET_ARCH").map(|a| a == "arm").unwrap_or(false);
    if supplied.is_some() && targets_arm {
        validate_feature_flags_against_configuration(&configuration);
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    generate_modules(&out_dir, &configuration)?;
    println!("cargo:rustc-link-search={}", out_dir.display());

    Ok(())
}

fn validate_feature_flags_against_configuration(configuration: &Configuration) {
    let supplied_flags: Vec<_> = env::vars()
        .filter_map(|(k, _)| Some(k.strip_prefix("CARGO_FEATURE_")?.to_lowercase()))
        .collect();

    let missing_flags: Vec<_> = configuration
        .required_feature_flags()
        .map(|s| s.replace('-', "_"))
        .filter(|f| !supplied_flags.contains(f))
        .collect();

    if !missing_flags.is_empty() {
        panic!(
            "\n\nThe configuration file requires flags that haven't been supplied. \
            Please build again with `--features={}`\n\n",
            missing_flags.join(",").replace('_', "-"),
        );
    }
}
