//! Handler for `pinpick outdated`.

use miette::Result;

use pinpick_ops::ops_outdated;

pub fn exec() -> Result<()> {
    let project_root = super::project_root()?;
    ops_outdated::outdated(&project_root)?;
    Ok(())
}
