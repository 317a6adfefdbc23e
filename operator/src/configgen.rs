fn main() {
    print!("{}", serde_yaml::to_string(&common::config::options()).unwrap())
}
