pub mod webhdfs;
