//! Lumen Puzzle entry point
//!
//! Loads a level (or generates one from a seed), runs one light pass and
//! reports which targets were reached.
//!
//! Exit code: 0 when every target is hit, 1 when not, 2 on bad usage or a
//! level that fails to load.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::Result;
    use clap::Parser;

    use lumen_puzzle::generate::{GeneratorConfig, random_scene};
    use lumen_puzzle::sim::{hit_summary, is_complete, simulate};
    use lumen_puzzle::{EngineProfile, Grid, load_level};

    /// Run one light pass over a puzzle level and report the targets hit.
    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    struct CliArgs {
        /// Level file (JSON)
        #[arg(value_name = "LEVEL", required_unless_present = "random")]
        level: Option<PathBuf>,
        /// Generate a scene from this seed instead of loading a level
        #[arg(long, value_name = "SEED", conflicts_with = "level")]
        random: Option<u64>,
        /// Engine preset: play (fixed-bend lenses) or workshop (Snell lenses and prisms)
        #[arg(long, value_name = "PROFILE", default_value = "play", value_parser = parse_profile)]
        profile: EngineProfile,
    }

    fn parse_profile(name: &str) -> Result<EngineProfile, String> {
        EngineProfile::from_str(name)
            .ok_or_else(|| format!("unknown profile '{name}' (expected play or workshop)"))
    }

    /// Run one pass; returns whether the puzzle is complete
    fn run(args: CliArgs) -> Result<bool> {
        let mut scene = match (&args.level, args.random) {
            (_, Some(seed)) => random_scene(seed, &GeneratorConfig::default()),
            (Some(path), None) => load_level(path, Some(&Grid::default()))?.0,
            (None, None) => anyhow::bail!("no level given"),
        };

        let settings = args.profile.settings();
        log::info!(
            "Running pass ({} profile, {} lens model)",
            args.profile.as_str(),
            settings.lens_model.as_str()
        );
        let outcome = simulate(&mut scene, &settings);

        for hit in &outcome.hits {
            println!(
                "ray {} ({}) hit target {} at ({:.1}, {:.1})",
                hit.ray,
                hit.color.as_str(),
                hit.target,
                hit.pos.x,
                hit.pos.y
            );
        }
        for (color, hit, total) in hit_summary(&scene) {
            println!("{:>5}: {hit}/{total} targets", color.as_str());
        }

        let stats = &outcome.stats;
        println!(
            "{} rays, {} steps: {} out of bounds, {} absorbed, {} dispersed, {} capped",
            stats.rays,
            stats.steps,
            stats.out_of_bounds,
            stats.absorbed,
            stats.dispersed,
            stats.step_limited + stats.bounce_limited
        );

        let complete = is_complete(&scene);
        println!("{}", if complete { "COMPLETE" } else { "incomplete" });
        Ok(complete)
    }

    pub fn main() -> i32 {
        let args = match CliArgs::try_parse() {
            Ok(args) => args,
            Err(e) => {
                // Usage errors exit 2; --help and --version exit 0
                let _ = e.print();
                return e.exit_code();
            }
        };

        match run(args) {
            Ok(true) => 0,
            Ok(false) => 1,
            Err(e) => {
                eprintln!("error: {e:#}");
                2
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::error::ErrorKind;

        fn args(list: &[&str]) -> Result<CliArgs, clap::Error> {
            CliArgs::try_parse_from(std::iter::once("lumen-puzzle").chain(list.iter().copied()))
        }

        #[test]
        fn test_parse_level_and_profile() {
            let parsed = args(&["level_0.json", "--profile", "workshop"]).unwrap();
            assert_eq!(parsed.level, Some(PathBuf::from("level_0.json")));
            assert_eq!(parsed.random, None);
            assert_eq!(parsed.profile, EngineProfile::Workshop);
        }

        #[test]
        fn test_parse_random_seed() {
            let parsed = args(&["--random", "99"]).unwrap();
            assert_eq!(parsed.random, Some(99));
            assert_eq!(parsed.level, None);
            assert_eq!(parsed.profile, EngineProfile::Play);
        }

        #[test]
        fn test_profile_aliases() {
            let parsed = args(&["a.json", "--profile", "EDITOR"]).unwrap();
            assert_eq!(parsed.profile, EngineProfile::Workshop);
        }

        #[test]
        fn test_parse_errors() {
            assert!(args(&[]).is_err());
            assert!(args(&["--random", "abc"]).is_err());
            assert!(args(&["a.json", "b.json"]).is_err());
            assert!(args(&["a.json", "--profile", "arcade"]).is_err());
            assert!(args(&["a.json", "--verbose"]).is_err());
        }

        #[test]
        fn test_level_conflicts_with_random() {
            let err = args(&["a.json", "--random", "3"]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
            assert_eq!(err.exit_code(), 2);
        }

        #[test]
        fn test_usage_errors_exit_with_two() {
            assert_eq!(args(&[]).unwrap_err().exit_code(), 2);
            assert_eq!(args(&["--random", "abc"]).unwrap_err().exit_code(), 2);
            assert_eq!(args(&["--help"]).unwrap_err().exit_code(), 0);
        }

        #[test]
        fn test_random_run_reports() {
            let parsed = args(&["--random", "5", "--profile", "workshop"]).unwrap();
            assert!(run(parsed).is_ok());
        }

        #[test]
        fn test_missing_level_is_an_error() {
            let parsed = args(&["/nonexistent/lumen/level.json"]).unwrap();
            assert!(run(parsed).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lumen Puzzle (native) starting...");
    std::process::exit(cli::main());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The engine is driven by the embedding page on the web
}
