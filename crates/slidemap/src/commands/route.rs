use colored::Colorize;

use crate::map::route::Route;

pub fn run() {
    let route = Route::first_journey();
    println!("{}", route.name().bold());
    for (i, point) in route.points().iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {}",
            i + 1,
            point.name.cyan(),
            point.coordinates.to_string().dimmed()
        );
        if let Some(note) = &point.note {
            println!("      {note}");
        }
    }
}
