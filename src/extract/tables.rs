//! Static lookup tables for geography inference
//!
//! Keys are in [`normalize_key`](crate::extract::text::normalize_key) form.

/// Capital (or signature) city to the country it implies
pub const CAPITAL_TO_COUNTRY: &[(&str, &str)] = &[
    ("amsterdam", "Países Bajos"),
    ("atenas", "Grecia"),
    ("bangkok", "Tailandia"),
    ("berlin", "Alemania"),
    ("bruselas", "Bélgica"),
    ("budapest", "Hungría"),
    ("buenos_aires", "Argentina"),
    ("copenhague", "Dinamarca"),
    ("dublin", "Irlanda"),
    ("edimburgo", "Reino Unido"),
    ("el_cairo", "Egipto"),
    ("estambul", "Turquía"),
    ("estocolmo", "Suecia"),
    ("hanoi", "Vietnam"),
    ("helsinki", "Finlandia"),
    ("la_habana", "Cuba"),
    ("lima", "Perú"),
    ("lisboa", "Portugal"),
    ("londres", "Reino Unido"),
    ("madrid", "España"),
    ("marrakech", "Marruecos"),
    ("mexico_df", "México"),
    ("moscu", "Rusia"),
    ("nairobi", "Kenia"),
    ("nueva_delhi", "India"),
    ("nueva_york", "Estados Unidos"),
    ("oslo", "Noruega"),
    ("paris", "Francia"),
    ("pekin", "China"),
    ("praga", "República Checa"),
    ("rabat", "Marruecos"),
    ("reikiavik", "Islandia"),
    ("roma", "Italia"),
    ("san_jose", "Costa Rica"),
    ("santiago_de_chile", "Chile"),
    ("seul", "Corea del Sur"),
    ("tokio", "Japón"),
    ("varsovia", "Polonia"),
    ("viena", "Austria"),
    ("zagreb", "Croacia"),
];

/// Spanish city to its autonomous community
pub const SPAIN_CITY_TO_REGION: &[(&str, &str)] = &[
    ("almeria", "Andalucía"),
    ("cadiz", "Andalucía"),
    ("cordoba", "Andalucía"),
    ("granada", "Andalucía"),
    ("jerez_de_la_frontera", "Andalucía"),
    ("malaga", "Andalucía"),
    ("ronda", "Andalucía"),
    ("sevilla", "Andalucía"),
    ("ubeda", "Andalucía"),
    ("barcelona", "Cataluña"),
    ("girona", "Cataluña"),
    ("tarragona", "Cataluña"),
    ("bilbao", "País Vasco"),
    ("san_sebastian", "País Vasco"),
    ("vitoria", "País Vasco"),
    ("santiago_de_compostela", "Galicia"),
    ("a_coruna", "Galicia"),
    ("lugo", "Galicia"),
    ("vigo", "Galicia"),
    ("oviedo", "Asturias"),
    ("gijon", "Asturias"),
    ("covadonga", "Asturias"),
    ("santander", "Cantabria"),
    ("santillana_del_mar", "Cantabria"),
    ("leon", "Castilla y León"),
    ("burgos", "Castilla y León"),
    ("salamanca", "Castilla y León"),
    ("segovia", "Castilla y León"),
    ("avila", "Castilla y León"),
    ("toledo", "Castilla-La Mancha"),
    ("cuenca", "Castilla-La Mancha"),
    ("caceres", "Extremadura"),
    ("merida", "Extremadura"),
    ("trujillo", "Extremadura"),
    ("valencia", "Comunidad Valenciana"),
    ("alicante", "Comunidad Valenciana"),
    ("zaragoza", "Aragón"),
    ("pamplona", "Navarra"),
    ("logrono", "La Rioja"),
    ("murcia", "Región de Murcia"),
    ("palma", "Islas Baleares"),
    ("palma_de_mallorca", "Islas Baleares"),
    ("las_palmas_de_gran_canaria", "Islas Canarias"),
    ("santa_cruz_de_tenerife", "Islas Canarias"),
];

/// Common country spellings to their canonical label
pub const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("espana", "España"),
    ("mexico", "México"),
    ("peru", "Perú"),
    ("japon", "Japón"),
    ("tailandia", "Tailandia"),
    ("turquia", "Turquía"),
    ("eeuu", "Estados Unidos"),
    ("ee_uu", "Estados Unidos"),
    ("usa", "Estados Unidos"),
    ("estados_unidos", "Estados Unidos"),
    ("holanda", "Países Bajos"),
    ("paises_bajos", "Países Bajos"),
    ("belgica", "Bélgica"),
    ("hungria", "Hungría"),
    ("rumania", "Rumanía"),
    ("republica_checa", "República Checa"),
    ("chequia", "República Checa"),
    ("reino_unido", "Reino Unido"),
    ("inglaterra", "Reino Unido"),
    ("escocia", "Escocia"),
    ("panama", "Panamá"),
    ("canada", "Canadá"),
    ("jordania", "Jordania"),
    ("iran", "Irán"),
    ("libano", "Líbano"),
    ("sudafrica", "Sudáfrica"),
    ("corea_del_sur", "Corea del Sur"),
    ("nueva_zelanda", "Nueva Zelanda"),
    ("costa_rica", "Costa Rica"),
    ("republica_dominicana", "República Dominicana"),
];

/// Looks up `key` in a table
pub fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| *value)
}
