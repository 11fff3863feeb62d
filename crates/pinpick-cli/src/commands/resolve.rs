//! Handler for `pinpick resolve`.

use miette::Result;

use pinpick_ops::ops_resolve;

pub fn exec(package: &str) -> Result<()> {
    let project_root = super::project_root()?;
    ops_resolve::resolve(&project_root, package)?;
    Ok(())
}
