use clap::Args;

#[derive(Args, Debug)]
pub struct PsArgs {
    /// Only print the number of containers
    #[arg(short, long)]
    pub count: bool,
}

pub async fn execute(args: PsArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let mut client = global.create_client(global.options())?;
    let names = client.list_containers().await?;

    if args.count {
        println!("{}", names.len());
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
