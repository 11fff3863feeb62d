//! Handler for `pinpick check`.

use miette::Result;

use pinpick_ops::confirm::{AutoConfirm, Confirm, PromptConfirm};
use pinpick_ops::ops_check::{self, CheckOptions};

pub fn exec(yes: bool, dry_run: bool) -> Result<()> {
    let project_root = super::project_root()?;
    let confirm: Box<dyn Confirm> = if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(PromptConfirm)
    };
    let opts = CheckOptions { dry_run };
    ops_check::check(&project_root, &opts, confirm.as_ref())?;
    Ok(())
}
