mod logging;

use std::f64::consts::PI;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use litedraw::{Color, Font, Image, LiteDraw};
use tracing::info;

const USAGE: &str = "usage: litedraw-demo [--debug] <scenario> [args]

scenarios:
  first                 shapes, title and pen size
  click                 draw a square wherever you click
  arcs                  arcs and pies in degrees and radians
  save <file>           draw the arcs scene and save it as an image
  font [font-file]      large text
  image <file>          an image at native size
  image-scaled <file>   an image scaled to 200x200
  polygon               a filled triangle
  bezier                a Bezier curve
  animation             a moving square, 30 frames
  text-animation        text bouncing left and right until closed
  two-windows           one circle in each of two windows
  corners               a red pixel in every corner";

fn first() -> Result<()> {
    let l = LiteDraw::new()?;

    l.set_color(Color::RED);
    l.filled_rectangle(20, 20, 100, 100);

    l.set_title("Hello World")?;

    l.set_color(Color::BLUE);
    l.filled_circle(50, 50, 50);

    l.set_color(Color::LIGHT_BLUE);
    l.set_pen_size(5.0);
    l.draw_rectangle(30, 30, 200, 200);

    l.show()?;
    Ok(())
}

fn click() -> Result<()> {
    let w = LiteDraw::new()?;
    w.set_color(Color::RED);
    w.on_mouse_click(|d, m| {
        d.filled_rectangle(m.x, m.y, 10, 10);
        if let Err(e) = d.show() {
            tracing::warn!(error = %e, "show from click handler failed");
        }
    });
    Ok(())
}

fn arcs_scene(w: &LiteDraw) {
    w.set_color(Color::BLUE_VIOLET);

    w.draw_arc(200, 200, 50, 50, 0, 90);
    w.filled_arc(200, 400, 50, 50, 0, 270);

    w.draw_arc(400, 200, 50, 50, 0, PI / 2.0);
    w.filled_arc(400, 400, 50, 50, 0, PI * 3.0 / 2.0);

    w.set_color(Color::ORANGE);
    w.draw_rectangle(150, 150, 100, 100);

    w.set_color(Color::RED);
    w.filled_circle(200, 200, 10);
}

fn arcs() -> Result<()> {
    let w = LiteDraw::new()?;
    arcs_scene(&w);
    w.show()?;
    Ok(())
}

fn save(path: &str) -> Result<()> {
    let w = LiteDraw::new()?;
    arcs_scene(&w);
    w.as_image()
        .save(path)
        .with_context(|| format!("saving {path}"))?;
    info!(path, "saved");
    w.show()?;
    Ok(())
}

fn font(path: Option<&str>) -> Result<()> {
    let w = LiteDraw::new()?;
    let font = match path {
        Some(path) => Font::load(path, 20.0).with_context(|| format!("loading {path}"))?,
        None => Font::system_sans(20.0)?,
    };
    w.set_font(font);
    w.draw_text(200, 200, "MY BOLD TEXT!")?;
    w.show()?;
    Ok(())
}

fn image(path: &str, scaled: bool) -> Result<()> {
    let img = Image::open(path).with_context(|| format!("opening {path}"))?;
    let w = LiteDraw::new()?;
    if scaled {
        w.draw_image_scaled(100, 100, 200, 200, &img);
    } else {
        w.draw_image(10, 10, &img);
    }
    w.show()?;
    Ok(())
}

fn polygon() -> Result<()> {
    let w = LiteDraw::new()?;
    w.filled_polygon(&[(10, 40), (200, 200), (100, 30)]);
    w.show()?;
    Ok(())
}

fn bezier() -> Result<()> {
    let w = LiteDraw::new()?;
    w.draw_bezier((100, 100), (300, 200), (200, 300), (400, 400));
    w.show()?;
    Ok(())
}

fn animation() -> Result<()> {
    let draw = LiteDraw::new()?;

    for i in 0..30 {
        draw.reset();

        draw.set_color(Color::BLACK);
        draw.draw_text(100, 400, "Hello World!")?;
        draw.filled_rectangle(100 + i * 10, 100 + i, 100, 100);
        draw.set_color(Color::ORANGE);
        draw.filled_ellipse(20, 40, 20, 40);
        draw.show_for(Duration::from_millis(30))?;
    }
    Ok(())
}

fn text_animation() -> Result<()> {
    let w = LiteDraw::new()?;
    let (steps, end, offset) = (5, 80, 100);
    let pause = Duration::from_millis(10);

    let frame = |x: i32| -> litedraw::Result<()> {
        w.reset();
        w.draw_text(x, offset, "I'm animated!")?;
        w.show_for(pause)
    };

    loop {
        let forth = (0..end).map(|i| offset + i * steps);
        let back = (0..end).map(|i| offset + steps * end - i * steps);
        for x in forth.chain(back) {
            match frame(x) {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn two_windows() -> Result<()> {
    let w1 = LiteDraw::new()?;
    let w2 = LiteDraw::new()?;

    w1.draw_circle(100, 100, 50);
    w2.draw_circle(400, 200, 100);

    w1.show()?;
    w2.show()?;
    Ok(())
}

fn corners() -> Result<()> {
    let draw = LiteDraw::new()?;
    let size = 1;
    let (w, h) = (draw.width() as i32, draw.height() as i32);

    draw.set_color(Color::RED);
    draw.filled_rectangle(0, 0, size, size);
    draw.filled_rectangle(0, h - size, size, size);
    draw.filled_rectangle(w - size, 0, size, size);
    draw.filled_rectangle(w - size, h - size, size, size);
    draw.show()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let debug = match args.iter().position(|a| a == "--debug") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    logging::init(debug);

    let scenario = args.first().map(String::as_str).unwrap_or("first");
    let arg = args.get(1).map(String::as_str);
    info!(scenario, "starting");

    match (scenario, arg) {
        ("first", _) => first()?,
        ("click", _) => click()?,
        ("arcs", _) => arcs()?,
        ("save", Some(path)) => save(path)?,
        ("font", path) => font(path)?,
        ("image", Some(path)) => image(path, false)?,
        ("image-scaled", Some(path)) => image(path, true)?,
        ("polygon", _) => polygon()?,
        ("bezier", _) => bezier()?,
        ("animation", _) => animation()?,
        ("text-animation", _) => text_animation()?,
        ("two-windows", _) => two_windows()?,
        ("corners", _) => corners()?,
        _ => bail!("{USAGE}"),
    }

    litedraw::run();
    Ok(())
}
