// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging and hand off to the
//   selected command.
// - Returns `anyhow::Result`; only startup and converter failures end up here.
//   Upload failures are logged per file and never change the exit code.

use bundle_uploader::api::ApiClient;
use bundle_uploader::cli::{Cli, Command};
use bundle_uploader::{convert, logging, uploader};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    match cli.into_command() {
        Command::Upload(args) => {
            let config = args.into_config();
            let api = ApiClient::new(&config.endpoint, config.timeout)?;
            tracing::debug!(
                "Uploading {} to {}",
                config.bundles_dir.display(),
                api.endpoint()
            );
            let progress = uploader::progress_bar(config.show_progress);
            let mut stdout = std::io::stdout().lock();
            uploader::run(&api, &config.bundles_dir, &mut stdout, &progress);
        }
        Command::Convert(args) => {
            let config = args.into_config();
            let mut stdout = std::io::stdout().lock();
            convert::run(&config, &mut stdout)?;
        }
    }
    Ok(())
}
