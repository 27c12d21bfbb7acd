mod settings;
mod solver;
mod weak_form;
