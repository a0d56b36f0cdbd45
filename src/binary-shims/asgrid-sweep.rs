fn main() {
    asgrid_tasks::entry_points::asgrid_sweep();
}
