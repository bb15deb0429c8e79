use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toxguard_model::{DeviceSpec, PretrainedSource};

#[derive(Parser, Debug)]
#[command(name = "toxguard-serve")]
#[command(author, version, about = "Serve the ToxGuard toxicity classifier")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the comment form backed by the trained classifier
    Form {
        /// Listen port
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Listen address
        #[arg(short, long, default_value = "0.0.0.0")]
        address: String,

        /// Weight file written by training
        #[arg(short, long, default_value = "toxicity.safetensors")]
        weights: PathBuf,

        /// Encoder config and tokenizer: local directory or Hugging Face repo id
        #[arg(long, default_value = "bert-base-uncased", value_parser = parse_pretrained)]
        pretrained: PretrainedSource,

        /// Token sequence length
        #[arg(long, default_value = "128")]
        max_length: usize,

        /// Device: auto, cpu, cuda[:N], metal[:N]
        #[arg(long, default_value = "auto", value_parser = parse_device)]
        device: DeviceSpec,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Start the stub prediction endpoint used to exercise the replay client
    Mock {
        /// Listen port
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Listen address
        #[arg(short, long, default_value = "0.0.0.0")]
        address: String,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_pretrained(s: &str) -> Result<PretrainedSource, String> {
    s.parse()
}

fn parse_device(s: &str) -> Result<DeviceSpec, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_defaults() {
        let cli = Cli::try_parse_from(["toxguard-serve", "form"]).unwrap();
        match cli.command {
            Commands::Form {
                port,
                address,
                weights,
                max_length,
                device,
                ..
            } => {
                assert_eq!(port, 5000);
                assert_eq!(address, "0.0.0.0");
                assert_eq!(weights, PathBuf::from("toxicity.safetensors"));
                assert_eq!(max_length, 128);
                assert_eq!(device, DeviceSpec::Auto);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_mock_port() {
        let cli = Cli::try_parse_from(["toxguard-serve", "mock", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Mock { port: 9000, .. }));
    }

    #[test]
    fn test_bad_device_rejected() {
        assert!(Cli::try_parse_from(["toxguard-serve", "form", "--device", "tpu"]).is_err());
    }
}
