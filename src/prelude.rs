pub use std::collections::{HashMap, VecDeque};
pub use std::fmt::{self, Debug, Display};
pub use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock, Weak};

pub use crate::error::{Errno, Errno::*, Error, ErrorLocation, Result};
pub use crate::fs::{File, FileDesc, FileRef};
pub use crate::process::pid_t;

macro_rules! current {
    () => {
        crate::process::current::get()
    };
}
