fn main() {
    rakhi_swipe::run();
}
