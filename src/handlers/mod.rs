pub mod callback;

pub use callback::callback_router;
