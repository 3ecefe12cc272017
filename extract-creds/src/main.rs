use clap::Parser;
use kubecreds::{
    expand_env, kubeconfig_path, Extraction, Field, Logging, OutputMap, DEFAULT_CA_OUTPUT,
    DEFAULT_KUBECONFIG,
};
use tracing::debug;

/// Extract certificate authority, client certificate and client key data from kubeconfig
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    /// log level
    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,

    /// kubeconfig file
    #[clap(short = 'k', long, default_value = DEFAULT_KUBECONFIG)]
    kubeconfig: String,

    /// ca output file
    #[clap(long, default_value = DEFAULT_CA_OUTPUT)]
    ca: String,

    /// cert output file
    #[clap(long, default_value = "")]
    cert: String,

    /// key output file
    #[clap(long, default_value = "")]
    key: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let logging = Logging::new(&args.log_level)?;

    logging.scope(|| {
        debug!(version = env!("CARGO_PKG_VERSION"), "starting");

        let extraction = Extraction {
            kubeconfig: kubeconfig_path(&args.kubeconfig),
            outputs: OutputMap::new()
                .with_optional(Field::Ca, expand_env(&args.ca))
                .with_optional(Field::Cert, expand_env(&args.cert))
                .with_optional(Field::Key, expand_env(&args.key)),
        };
        extraction.run()?;

        Ok(())
    })
}
