pub mod img_stuffs;
