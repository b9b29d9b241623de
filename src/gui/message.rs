use std::path::PathBuf;

use crate::{
    launcher::{RunEvent, RunStopper},
    selection::SelectionField,
};

#[derive(Debug, Clone)]
pub enum Message {
    Pick(SelectionField),
    Picked(SelectionField, Option<PathBuf>),
    PickExecutable,
    PickedExecutable(Option<PathBuf>),
    RunRequested,
    StopRequested,
    Started {
        pid: Option<u32>,
        stopper: RunStopper,
    },
    Output(RunEvent),
    SpawnFailed(String),
    NoticeClosed,
}
