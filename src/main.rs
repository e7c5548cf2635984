use hdfs_stream::app;

fn main() {
    std::process::exit(app::run());
}
