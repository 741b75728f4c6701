//! Handler for `kiln tree`.

use miette::Result;

use kiln_ops::ops_tree::{self, TreeOptions};
use kiln_ops::project::Overrides;

pub fn exec(
    overrides: &Overrides,
    depth: Option<usize>,
    duplicates: bool,
    invert: Option<String>,
    why: Option<String>,
    conflicts: bool,
) -> Result<()> {
    let project = super::current_project(overrides)?;

    let opts = TreeOptions {
        depth,
        why,
        duplicates,
        conflicts,
        invert,
    };

    print!("{}", ops_tree::tree(&project, &opts)?);
    Ok(())
}
