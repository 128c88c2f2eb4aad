// Domain-layer modules: pure rules with no I/O
pub mod calendar {
    pub use crate::calendar::*;
}

pub mod dedup {
    pub use crate::dedup::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod policy {
    pub use crate::policy::*;
}

pub mod reference {
    pub use crate::reference::*;
}
