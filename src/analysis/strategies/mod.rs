pub mod cfamily;
pub mod javascript;
pub mod python;

pub use cfamily::CFamilyStrategy;
pub use javascript::JavaScriptStrategy;
pub use python::PythonStrategy;
