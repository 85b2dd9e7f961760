pub mod directory_loader;
