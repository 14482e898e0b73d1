mod diagnose;

pub use diagnose::DiagnoseUseCase;
