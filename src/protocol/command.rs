use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "modloc",
    version,
    about = "Creates English variants of Russian game mods by transliteration or translation"
)]
pub struct Cli {
    /// JSON file overriding the mod directory layout
    #[arg(long, global = true)]
    pub layout: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TransformArgs {
    /// Use remote translation instead of transliteration. Requires a DeepL
    /// account (DEEPL_API_KEY and DEEPL_URI)
    #[arg(long)]
    pub translate: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a language asset as JSON
    Show { file: PathBuf },

    /// Translate a single language asset into `<file>.transl`
    #[command(name = "transl-dat", alias = "transl_dat")]
    TranslDat {
        #[command(flatten)]
        transform: TransformArgs,

        /// Print the result to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        file: PathBuf,
    },

    /// Localize one mod directory
    #[command(name = "transl-mod", alias = "transl_mod")]
    TranslMod {
        #[command(flatten)]
        transform: TransformArgs,

        /// Back up and replace an existing target asset
        #[arg(long)]
        rewrite: bool,

        folder: PathBuf,
    },

    /// Localize every `<category>/<mod>` directory under a folder
    #[command(name = "transl-all-mods", alias = "transl_all_mods")]
    TranslAllMods {
        #[command(flatten)]
        transform: TransformArgs,

        /// Back up and replace existing target assets
        #[arg(long)]
        rewrite: bool,

        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        jobs: Option<usize>,

        /// Share one translation cache between all mods
        #[arg(long)]
        share_cache: bool,

        /// Write the batch summary as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        folder: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batch_flags() {
        let cli = Cli::parse_from([
            "modloc",
            "transl_all_mods",
            "--translate",
            "--jobs",
            "3",
            "--share-cache",
            "mods",
        ]);

        match cli.command {
            Command::TranslAllMods {
                transform,
                rewrite,
                jobs,
                share_cache,
                report,
                folder,
            } => {
                assert!(transform.translate);
                assert!(report.is_none());
                assert!(!rewrite);
                assert_eq!(jobs, Some(3));
                assert!(share_cache);
                assert_eq!(folder, PathBuf::from("mods"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn stdout_flag_on_single_asset() {
        let cli = Cli::parse_from(["modloc", "transl-dat", "--stdout", "Lang.dat"]);
        assert!(matches!(
            cli.command,
            Command::TranslDat { stdout: true, transform: TransformArgs { translate: false }, .. }
        ));
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
