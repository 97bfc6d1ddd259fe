use clap::{Parser, Subcommand};

use recode_cli::commands::{config_ops, decode_ops, dict_ops, recoder_ops};

#[derive(Parser)]
#[command(name = "recodetool", about = "Symbol recoder and beam-search decoder tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a recoder table for a symbol list
    Encode {
        /// Symbol list (one symbol per line)
        symbols_file: String,
        /// Output recoder file
        output_file: String,
        /// Han radical-stroke table
        #[arg(long)]
        radicals: Option<String>,
        /// Do not add a null (blank) symbol
        #[arg(long)]
        no_null: bool,
    },
    /// Show recoder or dictionary info (auto-detected by magic bytes)
    Info {
        /// Recoder (RCDR) or dictionary (RCWD) file
        file: String,
        /// Symbol list, for readable recoder dumps
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Compile word lists into a dictionary
    DictCompile {
        /// Symbol list (one symbol per line)
        symbols_file: String,
        /// Output dictionary file
        output_file: String,
        /// System word list (repeatable)
        #[arg(long)]
        system: Vec<String>,
        /// User word list (repeatable)
        #[arg(long)]
        user: Vec<String>,
    },
    /// Decode a JSON probability matrix
    Decode {
        /// Symbol list (one symbol per line)
        symbols_file: String,
        /// JSON matrix: one array of class probabilities per timestep
        matrix_file: String,
        /// Recoder file (default: pass-through with null last)
        #[arg(long)]
        recoder: Option<String>,
        /// Dictionary file
        #[arg(long)]
        dict: Option<String>,
        /// Settings TOML file
        #[arg(long)]
        settings: Option<String>,
        /// Print extracted words
        #[arg(long)]
        words: bool,
        /// Dump every timestep's beams
        #[arg(long)]
        explain: bool,
        /// Line-box units per timestep
        #[arg(long, default_value = "1.0")]
        scale: f32,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    recode_cli::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Encode {
            symbols_file,
            output_file,
            radicals,
            no_null,
        } => recoder_ops::encode(&symbols_file, &output_file, radicals.as_deref(), no_null),
        Command::Info { file, symbols } => recoder_ops::info(&file, symbols.as_deref()),
        Command::DictCompile {
            symbols_file,
            output_file,
            system,
            user,
        } => {
            if system.is_empty() && user.is_empty() {
                eprintln!("Error: give at least one --system or --user word list");
                std::process::exit(1);
            }
            dict_ops::compile(&symbols_file, &system, &user, &output_file)
        }
        Command::Decode {
            symbols_file,
            matrix_file,
            recoder,
            dict,
            settings,
            words,
            explain,
            scale,
            json,
        } => {
            let opts = decode_ops::DecodeOptions {
                recoder: recoder.as_deref(),
                dict: dict.as_deref(),
                settings: settings.as_deref(),
                json,
                words,
                explain,
                scale,
            };
            decode_ops::decode(&symbols_file, &matrix_file, &opts);
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
