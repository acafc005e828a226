//! Drives the four artifacts of a translation run.
use crate::{ActBackend, Backend, BehBackend, EnvBackend, EvtBackend};
use aplan_ir::Context;
use aplan_utils::{AplanResult, OutputFile};
use std::path::Path;

/// Emit `project.evt_descript`, `project.env_descript`, `project.act`,
/// and `project.behp` into `dir`. Any failure aborts the run; downstream
/// tooling never sees a partial artifact set.
pub fn emit_project(ctx: &Context, dir: &Path) -> AplanResult<()> {
    std::fs::create_dir_all(dir)?;

    EvtBackend.run(ctx, OutputFile::file(dir.join("project.evt_descript")))?;
    log::info!(".evt_descript file created");

    EnvBackend.run(ctx, OutputFile::file(dir.join("project.env_descript")))?;
    log::info!(".env_descript file created");

    ActBackend.run(ctx, OutputFile::file(dir.join("project.act")))?;
    log::info!(".act file created");

    BehBackend.run(ctx, OutputFile::file(dir.join("project.behp")))?;
    log::info!(".behp file created");

    log::info!("translation completed");
    Ok(())
}
