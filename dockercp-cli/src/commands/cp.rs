use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Args;
use dockercp::FetchRequest;
use dockercp::constants::fetch::DEFAULT_BUFFER_LEN;

#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source as CONTAINER:SRC_PATH
    pub source: String,

    /// Destination directory on the host
    pub destination: PathBuf,

    /// I/O buffer size in bytes
    #[arg(short, long, default_value_t = default_buffer_size())]
    pub buffer_size: NonZeroUsize,

    /// Directory for the temporary archive file
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,
}

fn default_buffer_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_BUFFER_LEN).unwrap_or(NonZeroUsize::MIN)
}

pub async fn execute(args: CpArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let request =
        FetchRequest::from_source(&args.source, &args.destination, args.buffer_size.get())?;
    tracing::debug!(
        container = request.container(),
        path = request.source_path(),
        destination = %request.destination().display(),
        tmp_dir = ?args.tmp_dir,
        "Parsed copy request"
    );

    let mut options = global.options();
    options.temp_dir = args.tmp_dir;
    let mut client = global.create_client(options)?;

    let summary = client.fetch(&request).await?;
    println!(
        "Copied {}:{} to {} ({} entries, {} bytes via {})",
        request.container(),
        request.source_path(),
        summary.destination.display(),
        summary.entries_extracted,
        summary.bytes_downloaded,
        summary.backend
    );
    Ok(())
}
