use crate::cli::MergeArgs;
use crate::error::{CliError, Result};
use graphprot::core::io::archive::merge_archives;
use tracing::info;

pub fn run(args: MergeArgs) -> Result<()> {
    info!(
        "Merging {} partial archive(s) into {:?}",
        args.inputs.len(),
        &args.output
    );
    let groups = merge_archives(&args.inputs, &args.output, !args.keep_partials).map_err(
        |source| CliError::Archive {
            path: args.output.clone(),
            source,
        },
    )?;

    println!(
        "Merged {} group(s) from {} archive(s) into {}",
        groups,
        args.inputs.len(),
        args.output.display()
    );
    Ok(())
}
