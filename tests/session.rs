use std::io::Cursor;

use image::codecs::ico::IcoEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use paintlite::display::{DisplayBuffer, FrameSlot, refresh};
use paintlite::io::{SaveFormat, decode_image, encode_image};
use paintlite::ops::filters::luma;
use paintlite::{EditSession, PointerSample, Redraw};

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn encoded(img: &RgbaImage, format: SaveFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    encode_image(img, &mut bytes, format).unwrap();
    bytes
}

fn open_session(img: &RgbaImage) -> EditSession {
    let mut session = EditSession::default();
    session.open(Cursor::new(encoded(img, SaveFormat::Png))).unwrap();
    session
}

fn drag(session: &mut EditSession, from: (f32, f32), to: (f32, f32)) {
    session.pointer_down(from);
    session.pointer_move(PointerSample { pos: to, primary_down: true });
    session.pointer_up();
}

fn save_and_reload(session: &EditSession, format: SaveFormat) -> RgbaImage {
    let mut bytes = Vec::new();
    assert!(session.save(&mut bytes, format).unwrap());
    decode_image(Cursor::new(bytes)).unwrap()
}

fn palette_image() -> RgbaImage {
    RgbaImage::from_fn(40, 30, |x, y| Rgba([(x * 6) as u8, (y * 8) as u8, 90, 255]))
}

#[test]
fn grayscale_then_save_round_trips_losslessly() {
    let original = palette_image();
    let mut session = open_session(&original);
    assert_eq!(session.apply_grayscale(), Redraw::Canvas);

    for format in [SaveFormat::Png, SaveFormat::Bmp, SaveFormat::Gif] {
        let reloaded = save_and_reload(&session, format);
        assert_eq!(&reloaded, session.store().image().unwrap(), "{:?}", format);
        for (src, out) in original.pixels().zip(reloaded.pixels()) {
            let g = luma(src[0], src[1], src[2]);
            assert_eq!(out.0, [g, g, g, 255]);
        }
    }
}

#[test]
fn jpeg_round_trip_keeps_dimensions() {
    let session = open_session(&palette_image());
    assert_eq!(save_and_reload(&session, SaveFormat::Jpeg).dimensions(), (40, 30));
}

#[test]
fn stroke_darkens_narrow_vertical_band() {
    let mut session = open_session(&RgbaImage::from_pixel(128, 128, Rgba(WHITE)));
    drag(&mut session, (10.0, 10.0), (10.0, 50.0));

    let img = session.store().image().unwrap();
    for y in 12..48 {
        let dark = (0..128).filter(|&x| img.get_pixel(x, y)[0] < 128).count();
        assert_eq!(dark, 4, "row {y}");
        assert!(img.get_pixel(10, y)[0] < 128);
    }
    assert_eq!(img.get_pixel(100, 100).0, WHITE);
}

#[test]
fn pointer_moves_before_any_press_draw_nothing() {
    let blank = RgbaImage::from_pixel(32, 32, Rgba(WHITE));
    let mut session = open_session(&blank);
    for i in 0..10 {
        let pos = (i as f32 * 3.0, 16.0);
        assert_eq!(session.pointer_move(PointerSample { pos, primary_down: true }), Redraw::None);
    }
    assert_eq!(session.store().image().unwrap(), &blank);
}

#[test]
fn save_with_no_image_writes_nothing() {
    let session = EditSession::default();
    let mut sink = Vec::new();
    assert!(!session.save(&mut sink, SaveFormat::Png).unwrap());
    assert!(sink.is_empty());
}

#[test]
fn opening_second_image_discards_first_strokes() {
    let mut session = open_session(&RgbaImage::from_pixel(64, 64, Rgba(WHITE)));
    drag(&mut session, (5.0, 5.0), (60.0, 60.0));

    let image_b = RgbaImage::from_pixel(64, 64, Rgba([10, 200, 30, 255]));
    let redraw = session.open(Cursor::new(encoded(&image_b, SaveFormat::Png))).unwrap();
    assert_eq!(redraw, Redraw::Resize { width: 64, height: 64 });
    assert_eq!(session.store().image().unwrap(), &image_b);

    // The old gesture does not continue onto the new image.
    let sample = PointerSample { pos: (30.0, 30.0), primary_down: true };
    assert_eq!(session.pointer_move(sample), Redraw::None);
    assert_eq!(session.store().image().unwrap(), &image_b);
}

#[test]
fn refresh_reflects_latest_mutation_through_slot() {
    let mut session = open_session(&RgbaImage::from_pixel(16, 16, Rgba([200, 100, 50, 255])));
    let slot = FrameSlot::new();

    slot.publish(session.store().generation(), refresh(session.store()).unwrap());
    session.apply_grayscale();
    slot.publish(session.store().generation(), refresh(session.store()).unwrap());

    let frame: DisplayBuffer = slot.take().unwrap();
    let g = luma(200, 100, 50);
    assert_eq!(&frame.pixels[..4], &[g, g, g, 255]);
    assert!(slot.take().is_none());
}

#[test]
fn session_opens_tiff_and_ico() {
    let img = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 15) as u8, 128, (y * 15) as u8, 255]));

    let mut tiff = Cursor::new(Vec::new());
    TiffEncoder::new(&mut tiff).write_image(img.as_raw(), 16, 16, ColorType::Rgba8).unwrap();
    let mut ico = Vec::new();
    IcoEncoder::new(&mut ico).write_image(img.as_raw(), 16, 16, ColorType::Rgba8).unwrap();

    for bytes in [tiff.into_inner(), ico] {
        let mut session = EditSession::default();
        assert_eq!(session.open(Cursor::new(bytes)).unwrap(), Redraw::Resize { width: 16, height: 16 });
        assert_eq!(session.store().image().unwrap(), &img);
    }
}
